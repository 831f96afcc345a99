//! Linear soft-margin support vector machine trained with a simplified
//! SMO loop.

use crate::{validate_training_set, Error, Result};
use rand::Rng;
use tracing::debug;

pub struct SvmLinear {
    /// Soft-margin penalty.
    pub c: f32,
    /// KKT violation tolerance.
    pub tolerance: f32,
    /// Passes without any alpha update before training stops.
    pub max_passes: usize,
    pub max_iterations: usize,
    weights: Vec<f32>,
    bias: f32,
    label_neg: i32,
    label_pos: i32,
    trained: bool,
}

impl Default for SvmLinear {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-3,
            max_passes: 5,
            max_iterations: 1000,
            weights: Vec::new(),
            bias: 0.0,
            label_neg: -1,
            label_pos: 1,
            trained: false,
        }
    }
}

impl SvmLinear {
    pub fn new(c: f32) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    /// Signed distance from the decision hyperplane.
    pub fn decision_value(&self, sample: &[f32]) -> Result<f32> {
        if !self.trained {
            return Err(Error::InvalidInput("SVM is not trained".into()));
        }
        if sample.len() != self.weights.len() {
            return Err(Error::DimensionMismatch(format!(
                "sample dimension {} (expected {})",
                sample.len(),
                self.weights.len()
            )));
        }
        Ok(Self::dot(&self.weights, sample) + self.bias)
    }

    pub fn predict(&self, sample: &[f32]) -> Result<i32> {
        let v = self.decision_value(sample)?;
        Ok(if v >= 0.0 { self.label_pos } else { self.label_neg })
    }

    /// Train on a binary problem. Labels may be any two distinct values;
    /// the smaller maps to the negative side.
    pub fn train(&mut self, samples: &[Vec<f32>], labels: &[i32]) -> Result<()> {
        let dim = validate_training_set(samples, labels)?;

        let mut classes: Vec<i32> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() != 2 {
            return Err(Error::InvalidInput(format!(
                "binary SVM needs exactly 2 classes, got {}",
                classes.len()
            )));
        }
        self.label_neg = classes[0];
        self.label_pos = classes[1];

        let y: Vec<f32> = labels
            .iter()
            .map(|&l| if l == self.label_pos { 1.0 } else { -1.0 })
            .collect();

        let n = samples.len();
        let mut alphas = vec![0.0f32; n];
        let mut b = 0.0f32;
        let mut rng = rand::thread_rng();

        // Gram matrix of the linear kernel; the demo-scale problems this
        // serves keep n small.
        let gram: Vec<f32> = (0..n * n)
            .map(|idx| Self::dot(&samples[idx / n], &samples[idx % n]))
            .collect();

        let f = |alphas: &[f32], b: f32, i: usize| -> f32 {
            let mut sum = b;
            for j in 0..n {
                if alphas[j] > 0.0 {
                    sum += alphas[j] * y[j] * gram[j * n + i];
                }
            }
            sum
        };

        let mut passes = 0usize;
        let mut iterations = 0usize;
        while passes < self.max_passes && iterations < self.max_iterations {
            iterations += 1;
            let mut changed = 0usize;

            for i in 0..n {
                let e_i = f(&alphas, b, i) - y[i];
                let violates = (y[i] * e_i < -self.tolerance && alphas[i] < self.c)
                    || (y[i] * e_i > self.tolerance && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let e_j = f(&alphas, b, j) - y[j];

                let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);
                let (low, high) = if (y[i] - y[j]).abs() > f32::EPSILON {
                    (
                        (alphas[j] - alphas[i]).max(0.0),
                        (self.c + alphas[j] - alphas[i]).min(self.c),
                    )
                } else {
                    (
                        (alphas[i] + alphas[j] - self.c).max(0.0),
                        (alphas[i] + alphas[j]).min(self.c),
                    )
                };
                if (high - low).abs() < 1e-9 {
                    continue;
                }

                let eta = 2.0 * gram[i * n + j] - gram[i * n + i] - gram[j * n + j];
                if eta >= 0.0 {
                    continue;
                }

                let mut alpha_j = alpha_j_old - y[j] * (e_i - e_j) / eta;
                alpha_j = alpha_j.clamp(low, high);
                if (alpha_j - alpha_j_old).abs() < 1e-5 {
                    continue;
                }
                let alpha_i = alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j);

                let b1 = b
                    - e_i
                    - y[i] * (alpha_i - alpha_i_old) * gram[i * n + i]
                    - y[j] * (alpha_j - alpha_j_old) * gram[i * n + j];
                let b2 = b
                    - e_j
                    - y[i] * (alpha_i - alpha_i_old) * gram[i * n + j]
                    - y[j] * (alpha_j - alpha_j_old) * gram[j * n + j];

                b = if alpha_i > 0.0 && alpha_i < self.c {
                    b1
                } else if alpha_j > 0.0 && alpha_j < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                alphas[i] = alpha_i;
                alphas[j] = alpha_j;
                changed += 1;
            }

            if changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }
        debug!(iterations, "SMO training finished");

        // Collapse the dual solution into an explicit hyperplane.
        let mut weights = vec![0.0f32; dim];
        for i in 0..n {
            if alphas[i] > 0.0 {
                for (w, &x) in weights.iter_mut().zip(&samples[i]) {
                    *w += alphas[i] * y[i] * x;
                }
            }
        }

        self.weights = weights;
        self.bias = b;
        self.trained = true;
        Ok(())
    }

    /// The learned hyperplane as (weights, bias).
    pub fn hyperplane(&self) -> Option<(&[f32], f32)> {
        self.trained.then_some((self.weights.as_slice(), self.bias))
    }
}
