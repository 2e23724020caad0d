//! Word splitting and stemming for the keyword index.

use super::index::{EntryLocation, KeywordIndex};
use crate::table::SearchEntry;
use ahash::{AHashMap, AHashSet};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Weight of terms taken from an entry's label.
const LABEL_WEIGHT: f32 = 2.0;

/// Weight of terms taken from a target's scope (`vlbi.h`).
const SCOPE_WEIGHT: f32 = 1.0;

/// Common English stop words, skipped when they appear as a word part.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

type TermHash = u64;

/// Accumulates raw term frequencies per entry before scoring.
pub(crate) struct TermBuilder {
    term_docs: AHashMap<(TermHash, usize), f32>,
    doc_lengths: Vec<usize>,
    docs: Vec<EntryLocation>,
    stemmer: Stemmer,
}

impl Default for TermBuilder {
    fn default() -> Self {
        Self {
            term_docs: AHashMap::default(),
            doc_lengths: Vec::new(),
            docs: Vec::new(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl TermBuilder {
    /// Indexes one table entry as a document.
    pub(crate) fn add_entry(&mut self, location: EntryLocation, entry: &SearchEntry) {
        let doc = self.docs.len();
        self.docs.push(location);
        self.doc_lengths.push(0);

        self.add_terms(&entry.plain_label(), doc, LABEL_WEIGHT);

        let scopes: AHashSet<&str> = entry
            .targets
            .iter()
            .map(|t| t.scope.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        for scope in scopes {
            self.add_terms(scope, doc, SCOPE_WEIGHT);
        }
    }

    fn add_terms(&mut self, text: &str, doc: usize, weight: f32) {
        let words = tokenize_and_stem(text, &self.stemmer);

        let mut counts: AHashMap<String, usize> = AHashMap::with_capacity(words.len());
        for word in words {
            *counts.entry(word).or_insert(0) += 1;
        }

        self.doc_lengths[doc] += counts.values().sum::<usize>();

        for (word, count) in counts {
            *self.term_docs.entry((hash_term(&word), doc)).or_insert(0.0) +=
                count as f32 * weight;
        }
    }

    /// Scores every term with length-normalized TF-IDF:
    /// `(1 + ln(tf / length_norm)) * ln(total_docs / doc_freq)`.
    pub(crate) fn finalize(self) -> KeywordIndex {
        let start = std::time::Instant::now();
        let total_docs = self.docs.len() as f32;
        let avg_length = if self.doc_lengths.is_empty() {
            1.0
        } else {
            self.doc_lengths.iter().sum::<usize>() as f32 / self.doc_lengths.len() as f32
        };

        let pairs = self.term_docs.len();
        let mut grouped: HashMap<TermHash, Vec<(usize, f32)>> = HashMap::new();
        for ((term, doc), tf) in self.term_docs {
            grouped.entry(term).or_default().push((doc, tf));
        }

        let mut terms = HashMap::with_capacity(grouped.len());
        for (term, postings) in grouped {
            let idf = (total_docs / postings.len() as f32).ln();
            let mut scored: Vec<(usize, f32)> = postings
                .into_iter()
                .map(|(doc, tf)| {
                    let length = self.doc_lengths.get(doc).copied().unwrap_or(1).max(1) as f32;
                    let tf_normalized = tf / (length / avg_length).max(0.5);
                    (doc, (1.0 + tf_normalized.ln()).max(0.1) * idf)
                })
                .collect();
            scored.sort_by(|(da, a), (db, b)| b.total_cmp(a).then(da.cmp(db)));
            terms.insert(term, scored);
        }

        let index = KeywordIndex::new(terms, self.docs);
        tracing::info!(
            "Built keyword index: {} terms, {} entries, {} term-entry pairs in {:?}",
            index.term_count(),
            index.document_count(),
            pairs,
            start.elapsed()
        );
        index
    }
}

/// Splits text into searchable terms.
///
/// Words are runs of letters, digits, `_` and `-`. Each word is broken into
/// parts at separators, lower-to-upper case changes and letter/digit
/// boundaries; every part is stemmed. Compound words are also kept whole, so
/// `vlbi_add_stream` yields `vlbi`, `add`, `stream` and `vlbi_add_stream`.
pub(crate) fn tokenize_and_stem(text: &str, stemmer: &Stemmer) -> Vec<String> {
    let mut tokens = Vec::new();

    for word in text
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .filter(|w| !w.is_empty())
    {
        let parts = split_word(word);
        for part in &parts {
            let lowercase = part.to_lowercase();
            if STOP_WORDS.contains(&lowercase.as_str()) {
                continue;
            }
            tokens.push(stemmer.stem(&lowercase).into_owned());
        }
        if parts.len() > 1 {
            tokens.push(word.to_lowercase());
        }
    }

    tokens
}

fn split_word(word: &str) -> Vec<&str> {
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Class {
        Lower,
        Upper,
        Digit,
        Other,
    }

    let class = |c: char| {
        if c.is_numeric() {
            Class::Digit
        } else if c.is_uppercase() {
            Class::Upper
        } else if c.is_alphabetic() {
            Class::Lower
        } else {
            Class::Other
        }
    };

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut last = Class::Other;

    for (i, c) in word.char_indices() {
        let current = if c == '_' || c == '-' {
            Class::Other
        } else {
            class(c)
        };

        let boundary = match (last, current) {
            (_, Class::Other) => true,
            (Class::Lower, Class::Upper) => true,
            (Class::Digit, Class::Lower | Class::Upper) => true,
            (Class::Lower | Class::Upper, Class::Digit) => true,
            _ => false,
        };

        if boundary && let Some(s) = start.take() {
            parts.push(&word[s..i]);
        }
        if current != Class::Other && start.is_none() {
            start = Some(i);
        }
        last = current;
    }
    if let Some(s) = start {
        parts.push(&word[s..]);
    }
    parts
}

/// Stable hash of a term. Persisted in the index cache, so it must not depend
/// on a per-process seed.
pub(crate) fn hash_term(term: &str) -> u64 {
    xxh3_64(term.to_lowercase().as_bytes())
}
