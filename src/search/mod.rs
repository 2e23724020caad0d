//! Query support: widget-compatible prefix lookup and TF-IDF keyword search.

pub mod index;
pub mod prefix;
pub mod scoring;
pub(crate) mod tokenize;

pub use index::{EntryLocation, KeywordIndex, KeywordMatch};
pub use prefix::{matches_prefix, normalize_query, prefix_matches, query_bucket};
pub use scoring::{Suggestion, calculate_relevance, fuzzy_suggestions};
