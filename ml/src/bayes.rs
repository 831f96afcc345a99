//! Gaussian naive Bayes classifier.

use crate::{validate_training_set, Error, Result};

struct ClassModel {
    label: i32,
    log_prior: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
}

pub struct NormalBayes {
    classes: Vec<ClassModel>,
    dim: usize,
}

const VAR_FLOOR: f64 = 1e-6;

impl NormalBayes {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            dim: 0,
        }
    }

    pub fn train(&mut self, samples: &[Vec<f32>], labels: &[i32]) -> Result<()> {
        let dim = validate_training_set(samples, labels)?;
        let n = samples.len() as f64;

        let mut class_labels: Vec<i32> = labels.to_vec();
        class_labels.sort_unstable();
        class_labels.dedup();

        let mut classes = Vec::with_capacity(class_labels.len());
        for &label in &class_labels {
            let members: Vec<&Vec<f32>> = samples
                .iter()
                .zip(labels)
                .filter(|(_, &l)| l == label)
                .map(|(s, _)| s)
                .collect();
            let m = members.len() as f64;

            let mut means = vec![0.0f64; dim];
            for s in &members {
                for (acc, &v) in means.iter_mut().zip(s.iter()) {
                    *acc += v as f64;
                }
            }
            for mu in &mut means {
                *mu /= m;
            }

            let mut variances = vec![0.0f64; dim];
            for s in &members {
                for ((acc, &v), mu) in variances.iter_mut().zip(s.iter()).zip(&means) {
                    let d = v as f64 - mu;
                    *acc += d * d;
                }
            }
            for var in &mut variances {
                *var = (*var / m).max(VAR_FLOOR);
            }

            classes.push(ClassModel {
                label,
                log_prior: (m / n).ln(),
                means,
                variances,
            });
        }

        self.classes = classes;
        self.dim = dim;
        Ok(())
    }

    fn log_likelihood(&self, model: &ClassModel, sample: &[f32]) -> f64 {
        let mut ll = model.log_prior;
        for ((&v, mu), var) in sample.iter().zip(&model.means).zip(&model.variances) {
            let d = v as f64 - mu;
            ll += -0.5 * ((2.0 * std::f64::consts::PI * var).ln() + d * d / var);
        }
        ll
    }

    pub fn predict(&self, sample: &[f32]) -> Result<i32> {
        if self.classes.is_empty() {
            return Err(Error::InvalidInput("classifier is not trained".into()));
        }
        if sample.len() != self.dim {
            return Err(Error::DimensionMismatch(format!(
                "sample dimension {} (expected {})",
                sample.len(),
                self.dim
            )));
        }

        let best = self
            .classes
            .iter()
            .map(|c| (c.label, self.log_likelihood(c, sample)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("at least one class");
        Ok(best.0)
    }
}

impl Default for NormalBayes {
    fn default() -> Self {
        Self::new()
    }
}
