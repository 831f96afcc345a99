//! Classical machine-learning models over row-major f32 feature vectors.

pub mod bayes;
pub mod dtree;
pub mod kmeans;
pub mod knn;
pub mod svm;

pub use bayes::*;
pub use dtree::*;
pub use kmeans::*;
pub use knn::*;
pub use svm::*;

pub use cvkit_core::{Error, Result};

/// Iteration stop condition shared by iterative trainers.
#[derive(Debug, Clone, Copy)]
pub struct TermCriteria {
    pub max_iterations: usize,
    pub epsilon: f64,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon: 1e-4,
        }
    }
}

impl TermCriteria {
    pub fn new(max_iterations: usize, epsilon: f64) -> Self {
        Self {
            max_iterations,
            epsilon,
        }
    }
}

pub(crate) fn validate_training_set(samples: &[Vec<f32>], labels: &[i32]) -> Result<usize> {
    if samples.is_empty() {
        return Err(Error::InvalidInput("empty training set".into()));
    }
    if samples.len() != labels.len() {
        return Err(Error::DimensionMismatch(format!(
            "{} samples vs {} labels",
            samples.len(),
            labels.len()
        )));
    }
    let dim = samples[0].len();
    if dim == 0 {
        return Err(Error::InvalidInput("zero-dimensional samples".into()));
    }
    for (i, s) in samples.iter().enumerate() {
        if s.len() != dim {
            return Err(Error::DimensionMismatch(format!(
                "sample {i} has dimension {} (expected {dim})",
                s.len()
            )));
        }
    }
    Ok(dim)
}

pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
