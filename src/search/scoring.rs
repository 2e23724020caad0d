//! Relevance and similarity scoring.

use rapidfuzz::distance::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a label to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Simple text relevance:
/// - 100: exact match
/// - 50: text starts with query
/// - 10: text contains query
pub fn calculate_relevance(text: &str, query: &str) -> Option<u32> {
    if query.is_empty() {
        None
    } else if text == query {
        Some(100)
    } else if text.starts_with(query) {
        Some(50)
    } else if text.contains(query) {
        Some(10)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub label: String,
    pub score: f64,
}

/// Labels similar to `query`, most similar first, without duplicates.
pub fn fuzzy_suggestions<'a>(
    query: &str,
    labels: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return vec![];
    }

    let mut suggestions: Vec<Suggestion> = labels
        .into_iter()
        .filter_map(|label| {
            let score = jaro_winkler::similarity(query.chars(), label.to_lowercase().chars());
            (score >= SUGGESTION_THRESHOLD).then(|| Suggestion {
                label: label.to_string(),
                score,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    suggestions.dedup_by(|a, b| a.label == b.label);
    suggestions.truncate(limit);
    suggestions
}
