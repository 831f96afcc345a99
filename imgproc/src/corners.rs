//! Harris corner detection.

use crate::convolve::BorderMode;
use crate::edges::sobel_ex;
use cvkit_core::KeyPoint;
use image::GrayImage;

/// Harris corner response map: det(M) - k * trace(M)^2 over a
/// `block_size` x `block_size` structure tensor window.
pub fn harris_response(src: &GrayImage, block_size: usize, k: f64) -> Vec<f64> {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let half = (block_size / 2) as isize;

    let ix = sobel_ex(src, 1, 0, 3, BorderMode::Replicate);
    let iy = sobel_ex(src, 0, 1, 3, BorderMode::Replicate);

    let mut responses = vec![0.0f64; width * height];

    for y in half..height as isize - half {
        for x in half..width as isize - half {
            let mut i_xx = 0.0f64;
            let mut i_yy = 0.0f64;
            let mut i_xy = 0.0f64;

            for by in -half..=half {
                for bx in -half..=half {
                    let idx = ((y + by) as usize) * width + (x + bx) as usize;
                    let gx = ix[idx] as f64;
                    let gy = iy[idx] as f64;
                    i_xx += gx * gx;
                    i_yy += gy * gy;
                    i_xy += gx * gy;
                }
            }

            let det = i_xx * i_yy - i_xy * i_xy;
            let trace = i_xx + i_yy;
            responses[y as usize * width + x as usize] = det - k * trace * trace;
        }
    }

    responses
}

/// Detect Harris corners above `threshold`, keeping only 3x3 local maxima.
pub fn harris_detect(
    src: &GrayImage,
    block_size: usize,
    k: f64,
    threshold: f64,
) -> Vec<KeyPoint> {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let half = block_size / 2;
    let responses = harris_response(src, block_size, k);
    let mut keypoints = Vec::new();

    for y in (half + 1)..height.saturating_sub(half + 1) {
        for x in (half + 1)..width.saturating_sub(half + 1) {
            let idx = y * width + x;
            let response = responses[idx];
            if response <= threshold {
                continue;
            }

            let mut is_max = true;
            'window: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nidx = ((y as i32 + dy) as usize) * width + (x as i32 + dx) as usize;
                    if responses[nidx] > response {
                        is_max = false;
                        break 'window;
                    }
                }
            }

            if is_max {
                keypoints.push(KeyPoint::new(x as f64, y as f64).with_response(response as f32));
            }
        }
    }

    keypoints
}
