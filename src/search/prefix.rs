//! Prefix search with the same semantics as the generated HTML search box.

use crate::table::{SearchEntry, SearchTable, bucket_char, escape_token};

/// Converts raw user input into the escaped form stored in tables.
///
/// Spaces at either end are dropped; the rest is lowercased and escaped,
/// so `"  VLBI "` becomes `vlbi` and `"vlbi defines"` becomes `vlbi_20defines`.
/// The first remaining character is also the first character after the
/// leading spaces, so the bucket is unaffected by the trailing trim.
pub fn normalize_query(query: &str) -> String {
    escape_token(query.trim_start_matches(' ').trim_end_matches(' '))
}

/// The first character of a normalized query, which selects the bucket file.
pub fn query_bucket(normalized: &str) -> Option<char> {
    bucket_char(normalized)
}

/// Whether `entry` is a hit for an already normalized query. An empty query
/// matches nothing.
pub fn matches_prefix(entry: &SearchEntry, normalized: &str) -> bool {
    !normalized.is_empty() && entry.token.starts_with(normalized)
}

/// Entries whose token starts with `normalized`, in table order.
pub fn prefix_matches<'a>(
    table: &'a SearchTable,
    normalized: &'a str,
) -> impl Iterator<Item = &'a SearchEntry> + 'a {
    table
        .iter()
        .filter(move |entry| matches_prefix(entry, normalized))
}
