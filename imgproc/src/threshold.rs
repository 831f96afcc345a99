use crate::convolve::{gaussian_kernel_1d, separable_convolve, BorderMode};
use crate::histogram::compute_histogram;
use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Binary,
    BinaryInv,
    Trunc,
    ToZero,
    ToZeroInv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    MeanC,
    GaussianC,
}

fn apply_threshold(value: u8, thresh: u8, max_value: u8, typ: ThresholdType) -> u8 {
    match typ {
        ThresholdType::Binary => {
            if value > thresh {
                max_value
            } else {
                0
            }
        }
        ThresholdType::BinaryInv => {
            if value > thresh {
                0
            } else {
                max_value
            }
        }
        ThresholdType::Trunc => value.min(thresh),
        ThresholdType::ToZero => {
            if value > thresh {
                value
            } else {
                0
            }
        }
        ThresholdType::ToZeroInv => {
            if value > thresh {
                0
            } else {
                value
            }
        }
    }
}

pub fn threshold(src: &GrayImage, thresh: u8, max_value: u8, typ: ThresholdType) -> GrayImage {
    let mut dst = GrayImage::new(src.width(), src.height());

    for (i, out_px) in dst.as_mut().iter_mut().enumerate() {
        let value = src.as_raw()[i];
        *out_px = apply_threshold(value, thresh, max_value, typ);
    }

    dst
}

/// Otsu's method: pick the threshold maximizing between-class variance.
/// Returns the chosen threshold along with the thresholded image.
pub fn threshold_otsu(src: &GrayImage, max_value: u8, typ: ThresholdType) -> (u8, GrayImage) {
    let hist = compute_histogram(src);
    let total = (src.width() * src.height()) as f64;

    let mut sum_all = 0.0f64;
    for (i, &count) in hist.iter().enumerate() {
        sum_all += (i as f64) * (count as f64);
    }

    let mut weight_background = 0.0f64;
    let mut sum_background = 0.0f64;
    let mut best_between = -1.0f64;
    let mut best_threshold = 0u8;

    for t in 0u16..=255 {
        let idx = t as usize;
        weight_background += hist[idx] as f64;
        if weight_background <= f64::EPSILON {
            continue;
        }

        let weight_foreground = total - weight_background;
        if weight_foreground <= f64::EPSILON {
            break;
        }

        sum_background += (t as f64) * (hist[idx] as f64);
        let mean_background = sum_background / weight_background;
        let mean_foreground = (sum_all - sum_background) / weight_foreground;
        let diff = mean_background - mean_foreground;
        let between = weight_background * weight_foreground * diff * diff;

        if between > best_between {
            best_between = between;
            best_threshold = t as u8;
        }
    }

    let dst = threshold(src, best_threshold, max_value, typ);
    (best_threshold, dst)
}

pub fn adaptive_threshold(
    src: &GrayImage,
    max_value: u8,
    method: AdaptiveMethod,
    typ: ThresholdType,
    block_size: u32,
    c: f32,
) -> GrayImage {
    assert!(block_size >= 3, "block_size must be >= 3");
    assert!(block_size % 2 == 1, "block_size must be odd");
    assert!(
        matches!(typ, ThresholdType::Binary | ThresholdType::BinaryInv),
        "adaptive threshold supports Binary or BinaryInv types"
    );

    let local = match method {
        AdaptiveMethod::MeanC => {
            let k = vec![1.0 / block_size as f32; block_size as usize];
            separable_convolve(src, &k, &k, BorderMode::Replicate)
        }
        AdaptiveMethod::GaussianC => {
            let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let k = gaussian_kernel_1d(sigma, block_size as usize);
            separable_convolve(src, &k, &k, BorderMode::Replicate)
        }
    };

    let mut dst = GrayImage::new(src.width(), src.height());
    for i in 0..src.as_raw().len() {
        let value = src.as_raw()[i] as f32;
        let local_thresh = local.as_raw()[i] as f32 - c;
        dst.as_mut()[i] = match typ {
            ThresholdType::Binary => {
                if value > local_thresh {
                    max_value
                } else {
                    0
                }
            }
            ThresholdType::BinaryInv => {
                if value > local_thresh {
                    0
                } else {
                    max_value
                }
            }
            _ => 0,
        };
    }

    dst
}
