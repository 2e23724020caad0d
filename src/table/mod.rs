//! Search-index tables: `search/<section>_<n>.js` files.
//!
//! Each file holds one `searchData` array of `[token, [label, target...]]`
//! records. This module reads them, checks them, and writes them back.

pub mod entry;
pub mod escape;
pub mod parse;
pub mod validate;
pub mod write;

pub use entry::{SearchEntry, SearchTable, Target};
pub use escape::{bucket_char, escape_token, is_valid_token, unescape_token};
pub use parse::{parse_entry, parse_table};
pub use validate::{
    Issue, IssueKind, Severity, Strictness, ValidationReport, validate_bucket, validate_table,
};
pub use write::{write_entry, write_table};
