use crate::{DisparityMap, Result, StereoMatcher};
use cvkit_core::Error;
use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingMetric {
    /// Sum of absolute differences
    Sad,
    /// Sum of squared differences
    Ssd,
    /// Normalized cross-correlation
    Ncc,
}

/// Block matching stereo matcher over rectified pairs.
pub struct BlockMatcher {
    pub block_size: usize,
    pub min_disparity: i32,
    pub max_disparity: i32,
    pub metric: MatchingMetric,
    /// Best cost must beat the runner-up by this factor, else the pixel is
    /// marked invalid (0).
    pub uniqueness_ratio: f32,
}

impl Default for BlockMatcher {
    fn default() -> Self {
        Self {
            block_size: 11,
            min_disparity: 0,
            max_disparity: 64,
            metric: MatchingMetric::Sad,
            uniqueness_ratio: 0.95,
        }
    }
}

impl BlockMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn with_disparity_range(mut self, min: i32, max: i32) -> Self {
        self.min_disparity = min;
        self.max_disparity = max;
        self
    }

    pub fn with_metric(mut self, metric: MatchingMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_uniqueness_ratio(mut self, ratio: f32) -> Self {
        self.uniqueness_ratio = ratio;
        self
    }

    fn block_cost(
        &self,
        left: &[u8],
        right: &[u8],
        width: usize,
        x: i32,
        y: i32,
        d: i32,
        half: i32,
    ) -> f32 {
        match self.metric {
            MatchingMetric::Sad => {
                let mut sum = 0u32;
                for by in -half..=half {
                    let row = ((y + by) as usize) * width;
                    for bx in -half..=half {
                        let l = left[row + (x + bx) as usize] as i32;
                        let r = right[row + (x + bx - d) as usize] as i32;
                        sum += l.abs_diff(r);
                    }
                }
                sum as f32
            }
            MatchingMetric::Ssd => {
                let mut sum = 0u64;
                for by in -half..=half {
                    let row = ((y + by) as usize) * width;
                    for bx in -half..=half {
                        let l = left[row + (x + bx) as usize] as i64;
                        let r = right[row + (x + bx - d) as usize] as i64;
                        let diff = l - r;
                        sum += (diff * diff) as u64;
                    }
                }
                sum as f32
            }
            MatchingMetric::Ncc => {
                let mut sum_l = 0.0f64;
                let mut sum_r = 0.0f64;
                let mut sum_ll = 0.0f64;
                let mut sum_rr = 0.0f64;
                let mut sum_lr = 0.0f64;
                let n = ((2 * half + 1) * (2 * half + 1)) as f64;
                for by in -half..=half {
                    let row = ((y + by) as usize) * width;
                    for bx in -half..=half {
                        let l = left[row + (x + bx) as usize] as f64;
                        let r = right[row + (x + bx - d) as usize] as f64;
                        sum_l += l;
                        sum_r += r;
                        sum_ll += l * l;
                        sum_rr += r * r;
                        sum_lr += l * r;
                    }
                }
                let cov = sum_lr - sum_l * sum_r / n;
                let var_l = sum_ll - sum_l * sum_l / n;
                let var_r = sum_rr - sum_r * sum_r / n;
                let den = (var_l * var_r).sqrt();
                // Negated correlation so that lower = better, like SAD/SSD.
                if den > 1e-9 {
                    -(cov / den) as f32
                } else {
                    f32::MAX
                }
            }
        }
    }

    fn find_best_disparity(
        &self,
        left: &[u8],
        right: &[u8],
        width: usize,
        x: i32,
        y: i32,
        half: i32,
    ) -> f32 {
        let mut best_cost = f32::MAX;
        let mut second_cost = f32::MAX;
        let mut best_d = 0i32;

        for d in self.min_disparity..self.max_disparity {
            if x - d - half < 0 || x - d + half >= width as i32 {
                continue;
            }
            let cost = self.block_cost(left, right, width, x, y, d, half);
            if cost < best_cost {
                second_cost = best_cost;
                best_cost = cost;
                best_d = d;
            } else if cost < second_cost {
                second_cost = cost;
            }
        }

        if best_cost == f32::MAX {
            return 0.0;
        }

        // Uniqueness check: ambiguous matches are dropped.
        if second_cost.is_finite() && second_cost != f32::MAX {
            let limit = match self.metric {
                MatchingMetric::Ncc => second_cost - (1.0 - self.uniqueness_ratio),
                _ => second_cost * self.uniqueness_ratio,
            };
            if best_cost > limit {
                return 0.0;
            }
        }

        best_d as f32
    }
}

impl StereoMatcher for BlockMatcher {
    fn compute(&self, left: &GrayImage, right: &GrayImage) -> Result<DisparityMap> {
        if left.width() != right.width() || left.height() != right.height() {
            return Err(Error::DimensionMismatch(
                "Left and right images must have the same dimensions".to_string(),
            ));
        }
        if self.block_size % 2 == 0 {
            return Err(Error::InvalidInput("block_size must be odd".into()));
        }
        if self.min_disparity >= self.max_disparity {
            return Err(Error::InvalidInput(
                "min_disparity must be below max_disparity".into(),
            ));
        }

        let width = left.width() as i32;
        let height = left.height() as i32;
        let width_usize = left.width() as usize;
        let half_block = (self.block_size / 2) as i32;

        let left_data = left.as_raw();
        let right_data = right.as_raw();

        let mut disparity = DisparityMap::new(
            left.width(),
            left.height(),
            self.min_disparity,
            self.max_disparity,
        );

        // Row-parallel disparity search.
        disparity
            .data
            .par_chunks_mut(width_usize)
            .enumerate()
            .for_each(|(y_usize, row)| {
                let y = y_usize as i32;
                if y < half_block || y >= height - half_block {
                    return;
                }
                for x in half_block..width - half_block {
                    row[x as usize] = self.find_best_disparity(
                        left_data, right_data, width_usize, x, y, half_block,
                    );
                }
            });

        Ok(disparity)
    }
}
