//! Search table data model.

use super::escape::{bucket_char, unescape_token};
use crate::error::EscapeError;
use serde::{Deserialize, Serialize};

/// One jump-link of a search entry.
///
/// Written as `[url, local, scope]`. Some generators omit the flag and write
/// `[url, scope]`; that form reads back with `local == None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Relative page path, optionally followed by `#anchor`.
    pub url: String,
    /// `Some(true)` opens in the documentation frame, `Some(false)` marks an
    /// external reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
    /// Owning file or scope label. Empty for group and page entries.
    #[serde(default)]
    pub scope: String,
}

impl Target {
    pub fn new(url: impl Into<String>, local: bool, scope: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local: Some(local),
            scope: scope.into(),
        }
    }

    /// Whether the link stays inside this documentation set.
    pub fn is_local(&self) -> bool {
        self.local.unwrap_or(true)
    }

    /// The page part of the URL (everything before `#`).
    pub fn page(&self) -> &str {
        self.url.split_once('#').map_or(self.url.as_str(), |(page, _)| page)
    }

    /// The anchor fragment, if the URL has a `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.url.split_once('#').map(|(_, fragment)| fragment)
    }
}

/// A `[token, [label, target...]]` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Escaped search key, exactly as stored.
    pub token: String,
    /// Display text. May contain HTML entities.
    pub label: String,
    pub targets: Vec<Target>,
}

impl SearchEntry {
    pub fn new(token: impl Into<String>, label: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
            targets,
        }
    }

    pub fn unescaped_token(&self) -> Result<String, EscapeError> {
        unescape_token(&self.token)
    }

    /// Label with HTML entities decoded, for terminal output and matching.
    pub fn plain_label(&self) -> String {
        decode_html_entities(&self.label)
    }

    /// The character selecting this entry's bucket file.
    pub fn bucket_char(&self) -> Option<char> {
        bucket_char(&self.token)
    }

    /// Scope of the first target, or an empty string.
    pub fn primary_scope(&self) -> &str {
        self.targets.first().map_or("", |t| t.scope.as_str())
    }
}

/// An ordered search table, as loaded from one bucket file.
///
/// Order is significant: it is the display order of the search widget and is
/// never changed after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTable {
    entries: Vec<SearchEntry>,
    /// Whitespace after the closing `];`.
    trailing: String,
}

impl SearchTable {
    /// Creates a table in the generator's canonical layout.
    pub fn new(entries: Vec<SearchEntry>) -> Self {
        Self {
            entries,
            trailing: "\n".to_string(),
        }
    }

    pub(crate) fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = trailing.into();
        self
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SearchEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchEntry> {
        self.entries.iter()
    }

    pub fn trailing(&self) -> &str {
        &self.trailing
    }

    /// Entries whose escaped token equals `token` exactly.
    pub fn find<'a>(&'a self, token: &'a str) -> impl Iterator<Item = &'a SearchEntry> + 'a {
        self.entries.iter().filter(move |e| e.token == token)
    }
}

impl<'a> IntoIterator for &'a SearchTable {
    type Item = &'a SearchEntry;
    type IntoIter = std::slice::Iter<'a, SearchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("../group___v_l_b_i.html", "../group___v_l_b_i.html", None)]
    #[case("../vlbi_8h.html#ga1", "../vlbi_8h.html", Some("ga1"))]
    #[case("../vlbi_8h.html#", "../vlbi_8h.html", Some(""))]
    fn test_target_url_parts(
        #[case] url: &str,
        #[case] page: &str,
        #[case] fragment: Option<&str>,
    ) {
        let target = Target::new(url, true, "vlbi.h");
        check!(target.page() == page);
        check!(target.fragment() == fragment);
    }

    #[rstest]
    #[case("operator&lt;&lt;", "operator<<")]
    #[case("std::vector&lt; T &gt;", "std::vector< T >")]
    #[case("a &amp;lt; b", "a &lt; b")]
    #[case("vlbi_init", "vlbi_init")]
    fn test_plain_label(#[case] label: &str, #[case] expected: &str) {
        let entry = SearchEntry::new("x", label, vec![]);
        check!(entry.plain_label() == expected);
    }

    #[test]
    fn test_flagless_target_is_local() {
        let target = Target {
            url: "../a.html#b".into(),
            local: None,
            scope: String::new(),
        };
        check!(target.is_local());
        check!(!Target::new("x", false, "").is_local());
    }
}
