use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tfidf::FeatureMatrix;
use crate::error::{AppError, AppResult};

/// Dense N × N cosine similarity matrix stored row-major
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Computes pairwise cosine similarity over every pair of feature rows
    ///
    /// Only the upper triangle is computed; the lower triangle is mirrored from
    /// it so `get(i, j) == get(j, i)` holds exactly.
    pub fn from_features(features: &FeatureMatrix) -> Self {
        let rows = features.rows();
        let size = rows.len();
        let norms: Vec<f64> = rows.iter().map(|row| row.norm()).collect();

        let upper: Vec<Vec<f64>> = (0..size)
            .into_par_iter()
            .map(|i| {
                (i..size)
                    .map(|j| {
                        let denom = norms[i] * norms[j];
                        if denom == 0.0 {
                            0.0
                        } else {
                            (rows[i].dot(&rows[j]) / denom).clamp(-1.0, 1.0)
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; size * size];
        for (i, tail) in upper.into_iter().enumerate() {
            for (offset, sim) in tail.into_iter().enumerate() {
                let j = i + offset;
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        Self { size, values }
    }

    /// Builds a matrix from explicit rows, rejecting anything that is not square
    pub fn from_rows(rows: Vec<Vec<f64>>) -> AppResult<Self> {
        let size = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(AppError::ArtifactMismatch(format!(
                "similarity row {} has {} columns, expected {}",
                i,
                row.len(),
                size
            )));
        }
        Ok(Self {
            size,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.size {
            return None;
        }
        let start = index * self.size;
        Some(&self.values[start..start + self.size])
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.row(i).and_then(|row| row.get(j).copied())
    }

    /// Checks that the stored values form a square `size × size` matrix
    pub fn validate(&self) -> AppResult<()> {
        let expected = self.size.checked_mul(self.size).ok_or_else(|| {
            AppError::ArtifactMismatch(format!("similarity size {} overflows", self.size))
        })?;
        if self.values.len() != expected {
            return Err(AppError::ArtifactMismatch(format!(
                "similarity matrix has {} values, expected {}×{}",
                self.values.len(),
                self.size,
                self.size
            )));
        }
        Ok(())
    }
}
