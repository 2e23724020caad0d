//! TF-IDF keyword index over search-table labels.

use super::scoring::{Suggestion, calculate_relevance, fuzzy_suggestions};
use super::tokenize::{TermBuilder, hash_term, tokenize_and_stem};
use crate::table::SearchTable;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type TermHash = u64;

/// Where an indexed entry lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLocation {
    /// Bucket file name, e.g. `all_f.js`.
    pub file: String,
    /// Position of the entry inside that table.
    pub position: usize,
    /// Label with HTML entities decoded.
    pub label: String,
}

/// A ranked keyword hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordMatch<'a> {
    pub location: &'a EntryLocation,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordIndex {
    /// Term hash to `(document, score)`, best score first.
    terms: HashMap<TermHash, Vec<(usize, f32)>>,
    docs: Vec<EntryLocation>,
}

impl KeywordIndex {
    pub(super) fn new(
        terms: HashMap<TermHash, Vec<(usize, f32)>>,
        docs: Vec<EntryLocation>,
    ) -> Self {
        Self { terms, docs }
    }

    /// Indexes every entry of the given `(file name, table)` pairs.
    pub fn build<'a>(tables: impl IntoIterator<Item = (&'a str, &'a SearchTable)>) -> Self {
        let mut builder = TermBuilder::default();
        for (file, table) in tables {
            for (position, entry) in table.iter().enumerate() {
                let location = EntryLocation {
                    file: file.to_string(),
                    position,
                    label: entry.plain_label(),
                };
                builder.add_entry(location, entry);
            }
        }
        builder.finalize()
    }

    /// Ranks entries against a free-text query. Scores of all query terms are
    /// summed; labels equal to or starting with the query get a bonus.
    pub fn search(&self, query: &str, limit: usize) -> Vec<KeywordMatch<'_>> {
        let stemmer = Stemmer::create(Algorithm::English);
        let tokens = tokenize_and_stem(query, &stemmer);
        if tokens.is_empty() {
            return vec![];
        }

        let mut combined: HashMap<usize, f32> = HashMap::new();
        for token in &tokens {
            if let Some(postings) = self.terms.get(&hash_term(token)) {
                for &(doc, score) in postings {
                    *combined.entry(doc).or_insert(0.0) += score;
                }
            }
        }

        let query = query.trim().to_lowercase();
        let mut results: Vec<(usize, f32)> = combined
            .into_iter()
            .filter_map(|(doc, score)| {
                let location = self.docs.get(doc)?;
                let bonus = calculate_relevance(&location.label.to_lowercase(), &query)
                    .map_or(0.0, |r| r as f32 / 10.0);
                Some((doc, score + bonus))
            })
            .collect();
        results.sort_by(|(da, a), (db, b)| b.total_cmp(a).then(da.cmp(db)));

        results
            .into_iter()
            .take(limit)
            .map(|(doc, score)| KeywordMatch {
                location: &self.docs[doc],
                score,
            })
            .collect()
    }

    /// Labels resembling the query, for when `search` finds nothing.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        fuzzy_suggestions(query, self.docs.iter().map(|d| d.label.as_str()), limit)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    pub fn documents(&self) -> &[EntryLocation] {
        &self.docs
    }
}
