//! Data-integrity checks for search tables.

use super::entry::{SearchTable, Target};
use super::escape::{escape_token, unescape_token};
use crate::error::EscapeError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Base used to resolve relative target URLs. Tables live in `<html>/search/`.
static TABLE_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("http://docs.invalid/html/search/").expect("static base URL is valid")
});

/// How strictly target URLs and tokens are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Page-level targets (groups, files, pages) may omit the fragment, and
    /// tokens may contain non-ASCII characters.
    #[default]
    Lenient,
    /// Every target needs a non-empty fragment; tokens must be ASCII.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueKind {
    #[error("token is not escape-safe: {0}")]
    BadToken(EscapeError),
    #[error("token contains non-ASCII characters")]
    NonAsciiToken,
    #[error("entry has no targets")]
    NoTargets,
    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },
    #[error("target URL '{url}' has an empty fragment")]
    EmptyFragment { url: String },
    #[error("target URL '{url}' has no fragment")]
    MissingFragment { url: String },
    #[error("duplicate target '{url}' (first seen at entry {first})")]
    DuplicateTarget { url: String, first: usize },
    #[error("token does not match label (expected '{expected}')")]
    LabelMismatch { expected: String },
    #[error("entry belongs in the '{found}' bucket, not '{expected}'")]
    WrongBucket { expected: char, found: char },
}

impl IssueKind {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::LabelMismatch { .. } | Self::WrongBucket { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A problem found at one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Position of the entry in its table.
    pub entry: usize,
    pub token: String,
    pub kind: IssueKind,
}

impl Issue {
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: entry {} '{}': {}",
            self.severity(),
            self.entry,
            self.token,
            self.kind
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of entries checked.
    pub entries: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// True when there are no errors. Warnings don't count.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// Checks every entry of a table.
pub fn validate_table(table: &SearchTable, strictness: Strictness) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen: AHashMap<(&str, &str), usize> = AHashMap::with_capacity(table.len());

    for (index, entry) in table.iter().enumerate() {
        let mut push = |kind: IssueKind| {
            issues.push(Issue {
                entry: index,
                token: entry.token.clone(),
                kind,
            });
        };

        match unescape_token(&entry.token) {
            Err(err) => push(IssueKind::BadToken(err)),
            Ok(_) if strictness == Strictness::Strict && !entry.token.is_ascii() => {
                push(IssueKind::NonAsciiToken);
            }
            Ok(_) => {
                let expected = escape_token(&entry.plain_label());
                if expected != entry.token {
                    push(IssueKind::LabelMismatch { expected });
                }
            }
        }

        if entry.targets.is_empty() {
            push(IssueKind::NoTargets);
        }

        for target in &entry.targets {
            if let Some(kind) = check_target(target, strictness) {
                push(kind);
            }
            if let Some(&first) = seen.get(&(entry.token.as_str(), target.url.as_str())) {
                push(IssueKind::DuplicateTarget {
                    url: target.url.clone(),
                    first,
                });
            } else {
                seen.insert((entry.token.as_str(), target.url.as_str()), index);
            }
        }
    }

    ValidationReport {
        entries: table.len(),
        issues,
    }
}

/// Like [`validate_table`], and also checks that every entry was filed under
/// the bucket for `expected` (the character its file name stands for).
pub fn validate_bucket(
    table: &SearchTable,
    expected: char,
    strictness: Strictness,
) -> ValidationReport {
    let mut report = validate_table(table, strictness);
    for (index, entry) in table.iter().enumerate() {
        if let Some(found) = entry.bucket_char()
            && found != expected
        {
            report.issues.push(Issue {
                entry: index,
                token: entry.token.clone(),
                kind: IssueKind::WrongBucket { expected, found },
            });
        }
    }
    report.issues.sort_by_key(|issue| issue.entry);
    report
}

fn check_target(target: &Target, strictness: Strictness) -> Option<IssueKind> {
    let url = target.url.as_str();
    let invalid = |reason| {
        Some(IssueKind::InvalidUrl {
            url: url.to_string(),
            reason,
        })
    };

    if url.is_empty() {
        return invalid("empty URL");
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return invalid("contains whitespace or control characters");
    }
    if target.is_local() && Url::parse(url).is_ok() {
        return invalid("absolute URL in a local target");
    }
    if TABLE_BASE.join(url).is_err() {
        return invalid("not a relative URL reference");
    }

    match target.fragment() {
        Some("") => Some(IssueKind::EmptyFragment {
            url: url.to_string(),
        }),
        None if strictness == Strictness::Strict => Some(IssueKind::MissingFragment {
            url: url.to_string(),
        }),
        _ => None,
    }
}
