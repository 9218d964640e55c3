//! Pairwise cosine similarity over count vectors.
//!
//! The matrix is `N×N` with row/column `i` belonging to movie `i` of the
//! record table. Only the upper triangle is computed; the lower triangle is
//! a copy, which makes `get(i, j) == get(j, i)` exact rather than "equal
//! up to rounding".
//!
//! ## Zero vectors
//! A movie with no vocabulary tokens has similarity 0.0 with every movie,
//! itself included. Every other diagonal entry is exactly 1.0.

use crate::vectorizer::CountVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Storage precision of the matrix.
///
/// `Single` halves the size of the artifact; the loss is far below what
/// could change a top-5 ranking in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    Single,
    Double,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => f.write_str("single"),
            Precision::Double => f.write_str("double"),
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "f32" => Ok(Precision::Single),
            "double" | "f64" => Ok(Precision::Double),
            other => Err(format!(
                "unknown precision '{}', expected 'single' or 'double'",
                other
            )),
        }
    }
}

/// Row-major matrix values at the chosen precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatrixData {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

impl MatrixData {
    fn len(&self) -> usize {
        match self {
            MatrixData::Single(values) => values.len(),
            MatrixData::Double(values) => values.len(),
        }
    }
}

/// Square, symmetric similarity matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    dimension: usize,
    data: MatrixData,
}

impl SimilarityMatrix {
    /// Number of rows (= columns = movies)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn precision(&self) -> Precision {
        match self.data {
            MatrixData::Single(_) => Precision::Single,
            MatrixData::Double(_) => Precision::Double,
        }
    }

    /// True when the stored values really form a `dimension × dimension` matrix.
    ///
    /// Always true for matrices built here; used to reject corrupt artifacts.
    pub fn is_well_formed(&self) -> bool {
        self.dimension.checked_mul(self.dimension) == Some(self.data.len())
    }

    /// Entry `[i][j]`, widened to f64. Panics if out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.dimension && j < self.dimension, "index out of range");
        let idx = i * self.dimension + j;
        match &self.data {
            MatrixData::Single(values) => values[idx] as f64,
            MatrixData::Double(values) => values[idx],
        }
    }

    /// Row `i` as f64 scores, one per movie
    pub fn row(&self, i: usize) -> Vec<f64> {
        assert!(i < self.dimension, "row out of range");
        let range = i * self.dimension..(i + 1) * self.dimension;
        match &self.data {
            MatrixData::Single(values) => values[range].iter().map(|&v| v as f64).collect(),
            MatrixData::Double(values) => values[range].to_vec(),
        }
    }

    /// Raw storage, mainly for tests comparing runs bit for bit
    pub fn data(&self) -> &MatrixData {
        &self.data
    }
}

/// Cosine similarity of two vectors given their precomputed squared norms.
///
/// Taking one square root of the product keeps identical vectors at
/// exactly 1.0.
fn cosine(a: &CountVector, b: &CountVector, sq_norm_a: f64, sq_norm_b: f64) -> f64 {
    if sq_norm_a == 0.0 || sq_norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) as f64 / (sq_norm_a * sq_norm_b).sqrt()).min(1.0)
}

/// Compute the full pairwise cosine similarity matrix.
///
/// Rows of the upper triangle are computed in parallel; each entry depends
/// only on its two vectors, so the result does not depend on scheduling.
pub fn cosine_similarity_matrix(vectors: &[CountVector], precision: Precision) -> SimilarityMatrix {
    let n = vectors.len();
    let sq_norms: Vec<f64> = vectors.iter().map(|v| v.squared_norm() as f64).collect();
    let zero_vectors = sq_norms.iter().filter(|&&sq| sq == 0.0).count();
    debug!(
        "Computing {}x{} cosine similarity ({} zero vectors)",
        n, n, zero_vectors
    );

    // upper[i][k] holds entry (i, i + k)
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (i..n)
                .map(|j| {
                    if i == j {
                        if sq_norms[i] == 0.0 { 0.0 } else { 1.0 }
                    } else {
                        cosine(&vectors[i], &vectors[j], sq_norms[i], sq_norms[j])
                    }
                })
                .collect()
        })
        .collect();

    let data = match precision {
        Precision::Single => MatrixData::Single(mirror(n, &upper, |v| v as f32)),
        Precision::Double => MatrixData::Double(mirror(n, &upper, |v| v)),
    };

    SimilarityMatrix { dimension: n, data }
}

/// Expand the upper triangle into a full row-major matrix
fn mirror<T: Copy + Default>(n: usize, upper: &[Vec<f64>], convert: impl Fn(f64) -> T) -> Vec<T> {
    let mut values = vec![T::default(); n * n];
    for (i, row) in upper.iter().enumerate() {
        for (k, &score) in row.iter().enumerate() {
            let j = i + k;
            let value = convert(score);
            values[i * n + j] = value;
            values[j * n + i] = value;
        }
    }
    values
}
