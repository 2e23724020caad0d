//! The `searchdata.js` manifest: which search sections exist and which
//! first-character buckets each section has.
//!
//! ```text
//! var indexSectionsWithContent =
//! {
//!   0: "abcdeghilmnoprsv",
//!   1: "v"
//! };
//! ```
//!
//! Bucket files are named `<section>_<hex position>.js`, where the position is
//! the index of the bucket's first character in the section's content string.

use crate::error::ManifestError;
use crate::table::parse::unescape_js;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

/// The section every symbol is filed under in addition to its own.
pub const ALL_SECTION: &str = "all";

const CONTENT_BLOCK: &str = "indexSectionsWithContent";
const NAMES_BLOCK: &str = "indexSectionNames";
const LABELS_BLOCK: &str = "indexSectionLabels";

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+(\w+)\s*=\s*\{(.*?)\}\s*;").expect("static regex is valid")
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\d+)\s*:\s*"((?:[^"\\]|\\.)*)"\s*$"#).expect("static regex is valid")
});

/// One search category (`all`, `functions`, `groups`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSection {
    pub id: usize,
    /// File-name prefix, e.g. `functions`.
    pub name: String,
    /// Display label, e.g. `Functions`.
    pub label: String,
    /// First characters with a bucket file, in file-number order.
    pub first_chars: Vec<char>,
}

impl IndexSection {
    /// Position of the bucket for `c`, if the section has one.
    pub fn bucket_position(&self, c: char) -> Option<usize> {
        self.first_chars.iter().position(|&f| f == c)
    }

    /// Bucket file name for `c`, e.g. `all_f.js`.
    pub fn bucket_file(&self, c: char) -> Option<String> {
        self.bucket_position(c)
            .map(|position| bucket_file_name(&self.name, position))
    }

    /// Every bucket as `(first char, file name)`.
    pub fn bucket_files(&self) -> impl Iterator<Item = (char, String)> + '_ {
        self.first_chars
            .iter()
            .enumerate()
            .map(|(position, &c)| (c, bucket_file_name(&self.name, position)))
    }
}

pub fn bucket_file_name(section: &str, position: usize) -> String {
    format!("{}_{:x}.js", section, position)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexManifest {
    sections: Vec<IndexSection>,
}

impl IndexManifest {
    pub const fn new(sections: Vec<IndexSection>) -> Self {
        Self { sections }
    }

    /// Parses `searchdata.js`. The labels block is optional; sections without a
    /// label use their name.
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        let mut blocks: BTreeMap<&str, &str> = BTreeMap::new();
        for caps in BLOCK_RE.captures_iter(source) {
            if let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) {
                blocks.insert(name.as_str(), body.as_str());
            }
        }

        let content = parse_block(
            CONTENT_BLOCK,
            blocks
                .get(CONTENT_BLOCK)
                .ok_or(ManifestError::MissingBlock(CONTENT_BLOCK))?,
        )?;
        let names = parse_block(
            NAMES_BLOCK,
            blocks
                .get(NAMES_BLOCK)
                .ok_or(ManifestError::MissingBlock(NAMES_BLOCK))?,
        )?;
        let labels = match blocks.get(LABELS_BLOCK) {
            Some(body) => parse_block(LABELS_BLOCK, body)?,
            None => BTreeMap::new(),
        };

        let mut sections = Vec::with_capacity(content.len());
        for (id, chars) in content {
            let name = names
                .get(&id)
                .cloned()
                .ok_or(ManifestError::UnnamedSection(id))?;
            let label = labels.get(&id).cloned().unwrap_or_else(|| name.clone());
            sections.push(IndexSection {
                id,
                name,
                label,
                first_chars: chars.chars().collect(),
            });
        }

        tracing::debug!("Parsed search manifest with {} sections", sections.len());
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[IndexSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&IndexSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Total number of bucket files across all sections.
    pub fn bucket_count(&self) -> usize {
        self.sections.iter().map(|s| s.first_chars.len()).sum()
    }

    /// Renders the manifest in the generator's `searchdata.js` layout.
    pub fn to_js(&self) -> String {
        let mut out = String::new();
        push_block(&mut out, CONTENT_BLOCK, &self.sections, |s| {
            s.first_chars.iter().collect()
        });
        out.push('\n');
        push_block(&mut out, NAMES_BLOCK, &self.sections, |s| s.name.clone());
        out.push('\n');
        push_block(&mut out, LABELS_BLOCK, &self.sections, |s| s.label.clone());
        out.push('\n');
        out
    }
}

fn parse_block(
    block: &'static str,
    body: &str,
) -> Result<BTreeMap<usize, String>, ManifestError> {
    let mut items = BTreeMap::new();
    for item in split_items(body) {
        if item.trim().is_empty() {
            continue;
        }
        let bad = || ManifestError::BadEntry {
            block,
            text: item.trim().to_string(),
        };
        let caps = ITEM_RE.captures(item).ok_or_else(bad)?;
        let id = caps[1].parse::<usize>().map_err(|_| bad())?;
        let value = unescape_js(&caps[2]).ok_or_else(bad)?;
        items.insert(id, value);
    }
    Ok(items)
}

/// Splits an object body on commas outside string literals.
fn split_items(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                items.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&body[start..]);
    items
}

fn push_block(
    out: &mut String,
    name: &str,
    sections: &[IndexSection],
    value: impl Fn(&IndexSection) -> String,
) {
    let _ = writeln!(out, "var {} =\n{{", name);
    for (i, section) in sections.iter().enumerate() {
        let separator = if i + 1 < sections.len() { "," } else { "" };
        let _ = writeln!(
            out,
            "  {}: \"{}\"{}",
            section.id,
            escape_js(&value(section)),
            separator
        );
    }
    out.push_str("};\n");
}

fn escape_js(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
