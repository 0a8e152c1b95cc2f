use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::tokenize::analyze;
use crate::error::{AppError, AppResult};

/// Inverse document frequency formula
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IdfWeighting {
    /// `ln(N / df)`; a term present in every document carries no weight
    #[default]
    Standard,
    /// `ln((1 + N) / (1 + df)) + 1`; every term keeps a positive weight
    Smooth,
}

impl IdfWeighting {
    fn idf(self, n_docs: usize, doc_freq: usize) -> f64 {
        let n = n_docs as f64;
        let df = doc_freq as f64;
        match self {
            IdfWeighting::Standard => (n / df).ln(),
            IdfWeighting::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
        }
    }
}

impl Display for IdfWeighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdfWeighting::Standard => write!(f, "standard"),
            IdfWeighting::Smooth => write!(f, "smooth"),
        }
    }
}

/// Sparse feature row: `(column, weight)` pairs sorted by column, zeros omitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    entries: Vec<(usize, f64)>,
}

impl SparseRow {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product via a merge over the sorted column lists
    pub fn dot(&self, other: &SparseRow) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ci, wi) = self.entries[i];
            let (cj, wj) = other.entries[j];
            match ci.cmp(&cj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Weight of a column, 0.0 when absent
    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }
}

/// N × V TF-IDF matrix; row `i` belongs to catalog index `i`
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    rows: Vec<SparseRow>,
    vocabulary: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&SparseRow> {
        self.rows.get(index)
    }

    /// Column index of a vocabulary term
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
    }
}

/// Term-frequency × inverse-document-frequency vectorizer
///
/// The vocabulary is learned once from the whole corpus and sorted
/// alphabetically, so column order is reproducible across builds.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    weighting: IdfWeighting,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(weighting: IdfWeighting) -> Self {
        Self {
            weighting,
            ..Default::default()
        }
    }

    pub fn weighting(&self) -> IdfWeighting {
        self.weighting
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }

    /// Learns vocabulary and IDF weights, then returns the L2-normalized TF-IDF rows
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<FeatureMatrix> {
        if documents.is_empty() {
            return Err(AppError::EmptyVocabulary(
                "cannot fit on an empty corpus".to_string(),
            ));
        }

        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| analyze(d.as_ref())).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &analyzed {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(AppError::EmptyVocabulary(
                "documents contain only stop words".to_string(),
            ));
        }

        let n_docs = documents.len();
        let weighting = self.weighting;
        self.vocabulary = doc_freq
            .keys()
            .enumerate()
            .map(|(col, term)| (term.to_string(), col))
            .collect();
        self.idf = doc_freq
            .values()
            .map(|&df| weighting.idf(n_docs, df))
            .collect();

        let rows = analyzed.iter().map(|tokens| self.weigh(tokens)).collect();

        tracing::debug!(
            documents = n_docs,
            vocabulary = self.vocabulary.len(),
            weighting = %self.weighting,
            "Fitted TF-IDF vectorizer"
        );

        Ok(FeatureMatrix {
            rows,
            vocabulary: self.vocabulary.keys().cloned().collect(),
        })
    }

    fn weigh(&self, tokens: &[String]) -> SparseRow {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&col) = self.vocabulary.get(token) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| (col, tf * self.idf[col]))
            .filter(|(_, w)| *w != 0.0)
            .collect();
        entries.sort_unstable_by_key(|(col, _)| *col);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseRow { entries }
    }
}
