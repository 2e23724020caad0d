//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for doxysearch operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a search token cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("token is empty")]
    Empty,
    #[error("truncated escape sequence at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid escape digits '{digits}' at byte {offset}")]
    InvalidHex { offset: usize, digits: String },
    #[error("escape at byte {offset} decodes to non-ASCII byte 0x{value:02x}")]
    NotAscii { offset: usize, value: u8 },
    #[error("uppercase character '{ch}' at byte {offset}")]
    Uppercase { offset: usize, ch: char },
    #[error("unescaped character '{ch}' at byte {offset}")]
    Unescaped { offset: usize, ch: char },
}

/// Error returned when a search table file is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: expected {expected}, found {found}")]
pub struct ParseError {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    pub expected: String,
    pub found: String,
}

/// Error returned when `searchdata.js` is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("missing `var {0}` block")]
    MissingBlock(&'static str),
    #[error("malformed entry in `{block}`: {text}")]
    BadEntry { block: &'static str, text: String },
    #[error("section {0} has content but no name")]
    UnnamedSection(usize),
}

/// Error returned when loading part of a documentation tree fails.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Search index file not found at the expected path.
    #[error("search index not found at {}", path.display())]
    NotFound { path: PathBuf },
    /// The file exists but could not be read.
    #[error("failed to read {}: {error}", path.display())]
    Io { path: PathBuf, error: String },
    /// The file was read but is not a valid search table.
    #[error("failed to parse {}: {error}", path.display())]
    Parse { path: PathBuf, error: ParseError },
    /// The manifest has no section with this name.
    #[error("unknown search section '{0}'")]
    UnknownSection(String),
    /// Table files are plain names inside `search/`.
    #[error("'{0}' is not a file name inside the search directory")]
    InvalidFileName(String),
}

impl LoadError {
    pub(crate) fn from_io(path: PathBuf, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io {
                path,
                error: error.to_string(),
            }
        }
    }
}
