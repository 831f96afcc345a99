//! Generic robust model estimation via RANSAC.

use rand::seq::SliceRandom;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct RobustConfig {
    pub threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
    pub min_sample_size: usize,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            max_iterations: 1000,
            confidence: 0.99,
            min_sample_size: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RobustResult<M> {
    pub model: Option<M>,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
    pub residual: f64,
}

/// A model family that can be estimated from minimal samples and scored
/// per data point.
pub trait RobustModel<D> {
    type Model: Clone;

    fn min_sample_size(&self) -> usize;

    /// Estimate a model from a minimal sample. Degenerate samples return None.
    fn estimate(&self, data: &[&D]) -> Option<Self::Model>;

    fn compute_error(&self, model: &Self::Model, data: &D) -> f64;
}

pub struct Ransac<D, M: RobustModel<D>> {
    config: RobustConfig,
    _phantom: PhantomData<(D, M)>,
}

impl<D, M: RobustModel<D>> Ransac<D, M> {
    pub fn new(config: RobustConfig) -> Self {
        Self {
            config,
            _phantom: PhantomData,
        }
    }

    pub fn run(&self, estimator: &M, data: &[D]) -> RobustResult<M::Model> {
        let n = data.len();
        let k = estimator.min_sample_size();

        if n < k {
            return RobustResult {
                model: None,
                inliers: vec![false; n],
                num_inliers: 0,
                residual: f64::INFINITY,
            };
        }

        let mut best_model = None;
        let mut best_inliers = vec![false; n];
        let mut best_num_inliers = 0;
        let mut best_residual = f64::INFINITY;

        let mut rng = rand::thread_rng();
        let mut indices: Vec<usize> = (0..n).collect();

        for _ in 0..self.config.max_iterations {
            indices.shuffle(&mut rng);
            let sample: Vec<&D> = (0..k).map(|i| &data[indices[i]]).collect();

            let Some(model) = estimator.estimate(&sample) else {
                continue;
            };

            let mut inliers = vec![false; n];
            let mut num_inliers = 0;
            let mut total_error = 0.0;

            for (j, d) in data.iter().enumerate() {
                let err = estimator.compute_error(&model, d);
                if err < self.config.threshold {
                    inliers[j] = true;
                    num_inliers += 1;
                    total_error += err;
                }
            }

            let residual = if num_inliers > 0 {
                total_error / num_inliers as f64
            } else {
                f64::INFINITY
            };

            if num_inliers > best_num_inliers
                || (num_inliers == best_num_inliers && residual < best_residual)
            {
                best_num_inliers = num_inliers;
                best_inliers = inliers;
                best_model = Some(model);
                best_residual = residual;

                if num_inliers as f64 > n as f64 * self.config.confidence {
                    break;
                }
            }
        }

        RobustResult {
            model: best_model,
            inliers: best_inliers,
            num_inliers: best_num_inliers,
            residual: best_residual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = a*x + b fitted from 2-point samples.
    struct LineEstimator;

    impl RobustModel<(f64, f64)> for LineEstimator {
        type Model = (f64, f64);

        fn min_sample_size(&self) -> usize {
            2
        }

        fn estimate(&self, data: &[&(f64, f64)]) -> Option<(f64, f64)> {
            let (x0, y0) = *data[0];
            let (x1, y1) = *data[1];
            if (x1 - x0).abs() < 1e-12 {
                return None;
            }
            let a = (y1 - y0) / (x1 - x0);
            Some((a, y0 - a * x0))
        }

        fn compute_error(&self, model: &(f64, f64), data: &(f64, f64)) -> f64 {
            (model.0 * data.0 + model.1 - data.1).abs()
        }
    }

    #[test]
    fn line_fit_rejects_outliers() {
        let mut data: Vec<(f64, f64)> = (0..50)
            .map(|i| {
                let x = i as f64 * 0.1;
                (x, 2.0 * x + 1.0)
            })
            .collect();
        for i in (0..data.len()).step_by(7) {
            data[i].1 += 25.0;
        }

        let ransac = Ransac::new(RobustConfig {
            threshold: 0.1,
            max_iterations: 300,
            confidence: 0.99,
            min_sample_size: 2,
        });
        let res = ransac.run(&LineEstimator, &data);
        let (a, b) = res.model.unwrap();
        assert!((a - 2.0).abs() < 1e-6);
        assert!((b - 1.0).abs() < 1e-6);
        assert!(res.num_inliers >= 42);
    }
}
