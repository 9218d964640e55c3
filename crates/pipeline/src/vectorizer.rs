//! Bag-of-words vectorization.
//!
//! `CountVectorizer` fits a capped vocabulary over the whole corpus and
//! turns each document into a vector of token counts over that vocabulary.
//!
//! ## Selection rule
//! Tokens are ranked by their total count across the corpus. The
//! `max_features` highest are kept; equal counts are ordered by token in
//! ascending byte order, so the same corpus always yields the same
//! vocabulary. Columns are then laid out alphabetically.
//!
//! ## Normalization
//! Documents are lower-cased before tokenizing. No stemming or
//! lemmatization is applied.

use crate::stop_words::is_stop_word;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Split a document into lower-cased tokens.
///
/// A token is a maximal run of alphanumeric or `_` characters with at
/// least two characters; anything else is a separator. Stop words are
/// removed.
pub fn analyze(doc: &str) -> Vec<String> {
    doc.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Sparse count vector with a fixed dimension.
///
/// `entries` holds `(column, count)` pairs sorted by column, with no zero
/// counts. Two vectors from the same vocabulary always share `dim`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountVector {
    dim: usize,
    entries: Vec<(usize, u32)>,
}

impl CountVector {
    /// Build from `(column, count)` pairs; columns must be `< dim`.
    pub fn from_counts(dim: usize, counts: BTreeMap<usize, u32>) -> Self {
        debug_assert!(counts.keys().all(|&c| c < dim));
        Self {
            dim,
            entries: counts.into_iter().filter(|&(_, n)| n > 0).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(usize, u32)] {
        &self.entries
    }

    /// True when no vocabulary token occurs in the document
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for one column
    pub fn get(&self, column: usize) -> u32 {
        self.entries
            .binary_search_by_key(&column, |&(c, _)| c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0)
    }

    /// Dense representation, `dim` entries long
    pub fn to_dense(&self) -> Vec<u32> {
        let mut dense = vec![0; self.dim];
        for &(column, count) in &self.entries {
            dense[column] = count;
        }
        dense
    }

    /// Dot product via a merge over the two sorted entry lists
    pub fn dot(&self, other: &CountVector) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0u64;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, na) = self.entries[i];
            let (cb, nb) = other.entries[j];
            match ca.cmp(&cb) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += na as u64 * nb as u64;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn squared_norm(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| n as u64 * n as u64).sum()
    }
}

/// Fitted token → column mapping. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    columns: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from tokens; columns follow the sorted token order.
    fn from_tokens(mut tokens: Vec<String>) -> Self {
        tokens.sort();
        tokens.dedup();
        let columns = tokens
            .iter()
            .enumerate()
            .map(|(column, token)| (token.clone(), column))
            .collect();
        Self { tokens, columns }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn column(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    pub fn token(&self, column: usize) -> Option<&str> {
        self.tokens.get(column).map(String::as_str)
    }

    /// Tokens in column order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Count vocabulary tokens in a document; unknown tokens are ignored
    pub fn transform(&self, doc: &str) -> CountVector {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for token in analyze(doc) {
            if let Some(column) = self.column(&token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        CountVector::from_counts(self.len(), counts)
    }
}

/// Bag-of-words vectorizer with a vocabulary cap
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    max_features: usize,
}

impl CountVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Fit the vocabulary on a corpus
    pub fn fit<S: AsRef<str>>(&self, docs: &[S]) -> Vocabulary {
        let mut frequencies: HashMap<String, u64> = HashMap::new();
        for doc in docs {
            for token in analyze(doc.as_ref()) {
                *frequencies.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, u64)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        Vocabulary::from_tokens(ranked.into_iter().map(|(token, _)| token).collect())
    }

    /// Fit on the corpus and transform every document with the result
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> (Vocabulary, Vec<CountVector>) {
        let vocabulary = self.fit(docs);
        let vectors = docs
            .iter()
            .map(|doc| vocabulary.transform(doc.as_ref()))
            .collect();
        (vocabulary, vectors)
    }
}
