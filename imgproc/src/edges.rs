use crate::convolve::{
    gaussian_blur_with_border, laplacian_kernel, separable_convolve_f32, convolve_with_border,
    BorderMode,
};
use image::GrayImage;
use rayon::prelude::*;

fn sobel_kernels_1d(ksize: usize) -> Option<(Vec<f32>, Vec<f32>)> {
    match ksize {
        3 => Some((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])),
        5 => Some((
            vec![-1.0, -2.0, 0.0, 2.0, 1.0],
            vec![1.0, 4.0, 6.0, 4.0, 1.0],
        )),
        7 => Some((
            vec![-1.0, -4.0, -5.0, 0.0, 5.0, 4.0, 1.0],
            vec![1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0],
        )),
        _ => None,
    }
}

/// Signed Sobel derivative of order (dx, dy) as an f32 plane.
pub fn sobel_ex(
    src: &GrayImage,
    dx: i32,
    dy: i32,
    ksize: usize,
    border: BorderMode,
) -> Vec<f32> {
    let (deriv, smooth) =
        sobel_kernels_1d(ksize).unwrap_or((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0]));
    let kx = if dx > 0 { deriv.as_slice() } else { smooth.as_slice() };
    let ky = if dy > 0 { deriv.as_slice() } else { smooth.as_slice() };
    separable_convolve_f32(src, kx, ky, border)
}

/// 3x3 Sobel gradients scaled with |.| and clamped for display.
pub fn sobel(src: &GrayImage) -> (GrayImage, GrayImage) {
    sobel_with_border(src, BorderMode::Replicate)
}

pub fn sobel_with_border(src: &GrayImage, border: BorderMode) -> (GrayImage, GrayImage) {
    let gx = sobel_ex(src, 1, 0, 3, border);
    let gy = sobel_ex(src, 0, 1, 3, border);
    (
        plane_to_abs_image(&gx, src.width(), src.height()),
        plane_to_abs_image(&gy, src.width(), src.height()),
    )
}

fn plane_to_abs_image(plane: &[f32], width: u32, height: u32) -> GrayImage {
    let mut out = GrayImage::new(width, height);
    out.as_mut()
        .par_iter_mut()
        .zip(plane.par_iter())
        .for_each(|(o, &v)| *o = v.abs().min(255.0) as u8);
    out
}

pub fn sobel_magnitude(gx: &GrayImage, gy: &GrayImage) -> GrayImage {
    let width = gx.width();
    let height = gx.height();
    let count = (width * height) as usize;
    let mut output = vec![0u8; count];

    output
        .par_iter_mut()
        .zip(gx.as_raw().par_iter())
        .zip(gy.as_raw().par_iter())
        .for_each(|((out, &gx_val), &gy_val)| {
            let gx_f = gx_val as f32;
            let gy_f = gy_val as f32;
            let mag = (gx_f * gx_f + gy_f * gy_f).sqrt();
            *out = mag.min(255.0) as u8;
        });

    GrayImage::from_raw(width, height, output).unwrap_or_else(|| GrayImage::new(width, height))
}

pub fn laplacian(src: &GrayImage) -> GrayImage {
    convolve_with_border(src, &laplacian_kernel(), BorderMode::Replicate)
}

/// Gradient magnitude plus a quantized direction per pixel.
/// Direction codes: 0 = horizontal, 1 = 45 deg, 2 = vertical, 3 = 135 deg.
fn gradients_and_directions(src: &GrayImage) -> (Vec<f32>, Vec<u8>) {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let data = src.as_raw();
    let mut magnitude = vec![0.0f32; width * height];
    let mut direction = vec![0u8; width * height];

    magnitude
        .par_chunks_mut(width)
        .zip(direction.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (mag_row, dir_row))| {
            if y == 0 || y >= height - 1 {
                return;
            }
            let r0 = &data[(y - 1) * width..y * width];
            let r1 = &data[y * width..(y + 1) * width];
            let r2 = &data[(y + 1) * width..(y + 2) * width];

            for x in 1..width - 1 {
                let p00 = r0[x - 1] as f32;
                let p01 = r0[x] as f32;
                let p02 = r0[x + 1] as f32;
                let p10 = r1[x - 1] as f32;
                let p12 = r1[x + 1] as f32;
                let p20 = r2[x - 1] as f32;
                let p21 = r2[x] as f32;
                let p22 = r2[x + 1] as f32;

                let gx = -p00 + p02 - 2.0 * p10 + 2.0 * p12 - p20 + p22;
                let gy = -p00 - 2.0 * p01 - p02 + p20 + 2.0 * p21 + p22;

                mag_row[x] = (gx * gx + gy * gy).sqrt();

                let abs_gx = gx.abs();
                let abs_gy = gy.abs();
                let tan_22_5 = 0.41421356;

                if abs_gy <= abs_gx * tan_22_5 {
                    dir_row[x] = 0;
                } else if abs_gx <= abs_gy * tan_22_5 {
                    dir_row[x] = 2;
                } else if gx * gy > 0.0 {
                    dir_row[x] = 1;
                } else {
                    dir_row[x] = 3;
                }
            }
        });

    (magnitude, direction)
}

fn non_max_suppression(width: usize, height: usize, mag: &[f32], dir: &[u8]) -> Vec<f32> {
    let mut out = vec![0.0f32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            if y == 0 || y >= height - 1 {
                return;
            }
            let r0_idx = (y - 1) * width;
            let r1_idx = y * width;
            let r2_idx = (y + 1) * width;

            for x in 1..width - 1 {
                let m = mag[r1_idx + x];
                let (m1, m2) = match dir[r1_idx + x] {
                    0 => (mag[r1_idx + x - 1], mag[r1_idx + x + 1]),
                    1 => (mag[r0_idx + x + 1], mag[r2_idx + x - 1]),
                    2 => (mag[r0_idx + x], mag[r2_idx + x]),
                    _ => (mag[r0_idx + x - 1], mag[r2_idx + x + 1]),
                };

                if m >= m1 && m >= m2 {
                    out_row[x] = m;
                }
            }
        });

    out
}

fn hysteresis(width: usize, height: usize, nms: &[f32], low: f32, high: f32) -> GrayImage {
    const STRONG: u8 = 255;
    const WEAK: u8 = 75;

    let mut state = vec![0u8; width * height];
    let mut stack = Vec::new();

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let v = nms[idx];
            if v >= high {
                state[idx] = STRONG;
                stack.push((x, y));
            } else if v >= low {
                state[idx] = WEAK;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(height - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(width - 1);
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * width + nx;
                if state[nidx] == WEAK {
                    state[nidx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let mut out = GrayImage::new(width as u32, height as u32);
    out.as_mut().par_iter_mut().enumerate().for_each(|(i, px)| {
        *px = if state[i] == STRONG { 255 } else { 0 };
    });
    out
}

pub fn canny(src: &GrayImage, low_threshold: u8, high_threshold: u8) -> GrayImage {
    let blurred = gaussian_blur_with_border(src, 1.0, BorderMode::Reflect101);
    let width = blurred.width() as usize;
    let height = blurred.height() as usize;

    let (mag, dir) = gradients_and_directions(&blurred);
    let nms = non_max_suppression(width, height, &mag, &dir);
    let low = low_threshold as f32;
    let high = high_threshold.max(low_threshold) as f32;
    hysteresis(width, height, &nms, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn sobel_constant_image_is_zero() {
        let img = GrayImage::from_pixel(16, 16, Luma([100]));
        let (gx, gy) = sobel_with_border(&img, BorderMode::Reflect101);
        assert!(gx.as_raw().iter().all(|&v| v == 0));
        assert!(gy.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn sobel_vertical_edge() {
        let mut img = GrayImage::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let val = if x < 8 { 0u8 } else { 255u8 };
                img.put_pixel(x, y, Luma([val]));
            }
        }
        let (gx, _gy) = sobel(&img);
        assert!(gx.get_pixel(8, 8)[0] > 100);
    }

    #[test]
    fn sobel_horizontal_edge() {
        let mut img = GrayImage::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let val = if y < 8 { 0u8 } else { 255u8 };
                img.put_pixel(x, y, Luma([val]));
            }
        }
        let (_gx, gy) = sobel(&img);
        assert!(gy.get_pixel(8, 8)[0] > 100);
    }

    #[test]
    fn laplacian_constant_image() {
        let img = GrayImage::from_pixel(16, 16, Luma([128]));
        let lap = laplacian(&img);
        assert!(lap.as_raw().iter().all(|&v| v < 10));
    }

    #[test]
    fn canny_detects_square_outline() {
        let mut img = GrayImage::new(32, 32);
        for y in 8..24 {
            for x in 8..24 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let edges = canny(&img, 50, 150);
        assert!(edges.as_raw().iter().any(|&v| v > 0));
        // Interior of the square is uniform, no edges there.
        assert_eq!(edges.get_pixel(16, 16)[0], 0);
    }

    #[test]
    fn canny_uniform_image_has_no_edges() {
        let img = GrayImage::new(32, 32);
        let edges = canny(&img, 50, 150);
        assert!(edges.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_threshold_effect() {
        let mut img = GrayImage::new(32, 32);
        for y in 8..24 {
            for x in 8..24 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let edges_low = canny(&img, 10, 50);
        let edges_high = canny(&img, 100, 200);
        let low_count = edges_low.as_raw().iter().filter(|&&v| v > 0).count();
        let high_count = edges_high.as_raw().iter().filter(|&&v| v > 0).count();
        assert!(low_count >= high_count);
    }
}
