//! Optical flow estimation.
//!
//! - Lucas-Kanade: sparse iterative tracking, coarse-to-fine over a pyramid
//! - Horn-Schunck: dense flow with a global smoothness term

use crate::{build_pyramid, MotionField};
use cvkit_core::KeyPoint;
use cvkit_imgproc::get_pixel_bilinear;
use image::GrayImage;
use nalgebra::{Matrix2, Vector2};

/// Sparse pyramidal Lucas-Kanade tracker.
pub struct LucasKanade {
    pub window_size: usize,
    pub max_iterations: usize,
    pub epsilon: f32,
    pub pyramid_levels: usize,
}

impl Default for LucasKanade {
    fn default() -> Self {
        Self {
            window_size: 21,
            max_iterations: 30,
            epsilon: 0.01,
            pyramid_levels: 3,
        }
    }
}

impl LucasKanade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    pub fn with_pyramid_levels(mut self, levels: usize) -> Self {
        self.pyramid_levels = levels;
        self
    }

    /// Track a single point from `prev_frame` to `next_frame`. Returns the
    /// new position, or None when the point leaves the valid region or the
    /// local system is degenerate.
    pub fn track_point(
        &self,
        prev_frame: &GrayImage,
        next_frame: &GrayImage,
        point: (f32, f32),
    ) -> Option<(f32, f32)> {
        let prev_pyr = build_pyramid(prev_frame, self.pyramid_levels);
        let next_pyr = build_pyramid(next_frame, self.pyramid_levels);
        self.track_point_pyr(&prev_pyr, &next_pyr, point)
    }

    fn track_point_pyr(
        &self,
        prev_pyr: &[GrayImage],
        next_pyr: &[GrayImage],
        point: (f32, f32),
    ) -> Option<(f32, f32)> {
        let levels = prev_pyr.len().min(next_pyr.len());
        let mut flow = Vector2::new(0.0f32, 0.0f32);

        for level in (0..levels).rev() {
            let scale = (1 << level) as f32;
            let prev = &prev_pyr[level];
            let next = &next_pyr[level];
            let px = point.0 / scale;
            let py = point.1 / scale;

            // `flow` arrives already rescaled into this level's coordinates.
            flow = self.refine_at_level(prev, next, px, py, flow)?;
            if level > 0 {
                flow *= 2.0;
            }
        }

        Some((point.0 + flow[0], point.1 + flow[1]))
    }

    fn refine_at_level(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        x: f32,
        y: f32,
        init: Vector2<f32>,
    ) -> Option<Vector2<f32>> {
        let half = (self.window_size / 2) as i32;
        let w = prev.width() as f32;
        let h = prev.height() as f32;

        if x < (half + 1) as f32 || x >= w - (half + 1) as f32 || y < (half + 1) as f32
            || y >= h - (half + 1) as f32
        {
            return Some(init);
        }

        // Structure tensor over the window, from the previous frame.
        let mut a: Matrix2<f64> = Matrix2::zeros();
        let win = (2 * half + 1) * (2 * half + 1);
        let mut ix = vec![0.0f32; win as usize];
        let mut iy = vec![0.0f32; win as usize];

        let mut idx = 0;
        for dy in -half..=half {
            for dx in -half..=half {
                let sx = x + dx as f32;
                let sy = y + dy as f32;
                let gx = (get_pixel_bilinear(prev, sx + 1.0, sy)
                    - get_pixel_bilinear(prev, sx - 1.0, sy))
                    / 2.0;
                let gy = (get_pixel_bilinear(prev, sx, sy + 1.0)
                    - get_pixel_bilinear(prev, sx, sy - 1.0))
                    / 2.0;
                ix[idx] = gx;
                iy[idx] = gy;
                a[(0, 0)] += (gx * gx) as f64;
                a[(0, 1)] += (gx * gy) as f64;
                a[(1, 0)] += (gx * gy) as f64;
                a[(1, 1)] += (gy * gy) as f64;
                idx += 1;
            }
        }

        let a_inv = a.try_inverse()?;
        let mut flow = init;

        for _ in 0..self.max_iterations {
            let mut b: Vector2<f64> = Vector2::zeros();
            let mut idx = 0;
            for dy in -half..=half {
                for dx in -half..=half {
                    let sx = x + dx as f32;
                    let sy = y + dy as f32;
                    let nx = sx + flow[0];
                    let ny = sy + flow[1];
                    if nx < 1.0 || nx >= next.width() as f32 - 1.0 || ny < 1.0
                        || ny >= next.height() as f32 - 1.0
                    {
                        return None;
                    }
                    let it = get_pixel_bilinear(next, nx, ny) - get_pixel_bilinear(prev, sx, sy);
                    b[0] += -(ix[idx] * it) as f64;
                    b[1] += -(iy[idx] * it) as f64;
                    idx += 1;
                }
            }

            let delta = a_inv * b;
            flow[0] += delta[0] as f32;
            flow[1] += delta[1] as f32;

            if (delta[0] * delta[0] + delta[1] * delta[1]).sqrt() < self.epsilon as f64 {
                break;
            }
        }

        Some(flow)
    }

    /// Track multiple points, sharing the pyramids.
    pub fn track_points(
        &self,
        prev_frame: &GrayImage,
        next_frame: &GrayImage,
        points: &[(f32, f32)],
    ) -> Vec<Option<(f32, f32)>> {
        let prev_pyr = build_pyramid(prev_frame, self.pyramid_levels);
        let next_pyr = build_pyramid(next_frame, self.pyramid_levels);
        points
            .iter()
            .map(|&p| self.track_point_pyr(&prev_pyr, &next_pyr, p))
            .collect()
    }

    pub fn track_keypoints(
        &self,
        prev_frame: &GrayImage,
        next_frame: &GrayImage,
        keypoints: &[KeyPoint],
    ) -> Vec<Option<KeyPoint>> {
        let points: Vec<(f32, f32)> = keypoints.iter().map(|kp| (kp.x as f32, kp.y as f32)).collect();
        self.track_points(prev_frame, next_frame, &points)
            .into_iter()
            .zip(keypoints)
            .map(|(opt, kp)| {
                opt.map(|(x, y)| {
                    KeyPoint::new(x as f64, y as f64)
                        .with_size(kp.size)
                        .with_angle(kp.angle)
                })
            })
            .collect()
    }
}

/// Dense Horn-Schunck flow with Jacobi relaxation.
pub struct HornSchunck {
    /// Smoothness weight; larger values favor smoother fields.
    pub alpha: f32,
    pub iterations: usize,
}

impl Default for HornSchunck {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            iterations: 100,
        }
    }
}

impl HornSchunck {
    pub fn new(alpha: f32, iterations: usize) -> Self {
        Self { alpha, iterations }
    }

    pub fn compute(&self, prev: &GrayImage, next: &GrayImage) -> crate::Result<MotionField> {
        if prev.dimensions() != next.dimensions() {
            return Err(cvkit_core::Error::DimensionMismatch(
                "frames must have the same dimensions".into(),
            ));
        }

        let width = prev.width() as usize;
        let height = prev.height() as usize;
        let p = prev.as_raw();
        let n = next.as_raw();

        // Gradients averaged over both frames.
        let mut ix = vec![0.0f32; width * height];
        let mut iy = vec![0.0f32; width * height];
        let mut it = vec![0.0f32; width * height];
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let xp = (x + 1).min(width - 1);
                let xm = x.saturating_sub(1);
                let yp = (y + 1).min(height - 1);
                let ym = y.saturating_sub(1);
                ix[idx] = ((p[y * width + xp] as f32 - p[y * width + xm] as f32)
                    + (n[y * width + xp] as f32 - n[y * width + xm] as f32))
                    / 4.0;
                iy[idx] = ((p[yp * width + x] as f32 - p[ym * width + x] as f32)
                    + (n[yp * width + x] as f32 - n[ym * width + x] as f32))
                    / 4.0;
                it[idx] = n[idx] as f32 - p[idx] as f32;
            }
        }

        let mut field = MotionField::new(prev.width(), prev.height());
        let alpha2 = self.alpha * self.alpha;

        for _ in 0..self.iterations {
            let u = field.u.clone();
            let v = field.v.clone();
            for y in 0..height {
                for x in 0..width {
                    let idx = y * width + x;
                    let xp = (x + 1).min(width - 1);
                    let xm = x.saturating_sub(1);
                    let yp = (y + 1).min(height - 1);
                    let ym = y.saturating_sub(1);

                    let u_avg = (u[y * width + xp]
                        + u[y * width + xm]
                        + u[yp * width + x]
                        + u[ym * width + x])
                        / 4.0;
                    let v_avg = (v[y * width + xp]
                        + v[y * width + xm]
                        + v[yp * width + x]
                        + v[ym * width + x])
                        / 4.0;

                    let gx = ix[idx];
                    let gy = iy[idx];
                    let gt = it[idx];
                    let common = (gx * u_avg + gy * v_avg + gt) / (alpha2 + gx * gx + gy * gy);
                    field.u[idx] = u_avg - gx * common;
                    field.v[idx] = v_avg - gy * common;
                }
            }
        }

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn textured(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = (128.0
                    + 60.0 * ((x as f32) * 0.35).sin()
                    + 50.0 * ((y as f32) * 0.28).cos()) as u8;
                img.put_pixel(x, y, Luma([v]));
            }
        }
        img
    }

    fn shifted(src: &GrayImage, dx: i32, dy: i32) -> GrayImage {
        let mut out = GrayImage::new(src.width(), src.height());
        for y in 0..src.height() {
            for x in 0..src.width() {
                let sx = (x as i32 - dx).rem_euclid(src.width() as i32) as u32;
                let sy = (y as i32 - dy).rem_euclid(src.height() as i32) as u32;
                out.put_pixel(x, y, *src.get_pixel(sx, sy));
            }
        }
        out
    }

    #[test]
    fn lk_tracks_small_translation() {
        let prev = textured(64, 64);
        let next = shifted(&prev, 2, 1);
        let lk = LucasKanade::new().with_pyramid_levels(1);
        let tracked = lk.track_point(&prev, &next, (32.0, 32.0)).unwrap();
        assert!((tracked.0 - 34.0).abs() < 0.5, "x: {}", tracked.0);
        assert!((tracked.1 - 33.0).abs() < 0.5, "y: {}", tracked.1);
    }

    #[test]
    fn lk_pyramid_tracks_larger_translation() {
        let prev = textured(128, 128);
        let next = shifted(&prev, 6, 4);
        let lk = LucasKanade::new().with_pyramid_levels(3);
        let tracked = lk.track_point(&prev, &next, (64.0, 64.0)).unwrap();
        assert!((tracked.0 - 70.0).abs() < 1.0, "x: {}", tracked.0);
        assert!((tracked.1 - 68.0).abs() < 1.0, "y: {}", tracked.1);
    }

    #[test]
    fn lk_identical_frames_zero_flow() {
        let prev = textured(64, 64);
        let tracked = LucasKanade::new()
            .with_pyramid_levels(1)
            .track_point(&prev, &prev, (30.0, 30.0))
            .unwrap();
        assert!((tracked.0 - 30.0).abs() < 0.1);
        assert!((tracked.1 - 30.0).abs() < 0.1);
    }

    #[test]
    fn horn_schunck_recovers_dominant_direction() {
        let prev = textured(64, 64);
        let next = shifted(&prev, 1, 0);
        let hs = HornSchunck::new(5.0, 120);
        let field = hs.compute(&prev, &next).unwrap();

        // Mean horizontal flow in the interior should point in +x and
        // dominate the vertical component.
        let mut su = 0.0f32;
        let mut sv = 0.0f32;
        let mut cnt = 0;
        for y in 8..56u32 {
            for x in 8..56u32 {
                let (u, v) = field.get(x, y);
                su += u;
                sv += v;
                cnt += 1;
            }
        }
        let mu = su / cnt as f32;
        let mv = sv / cnt as f32;
        assert!(mu > 0.3, "mean u {mu}");
        assert!(mv.abs() < 0.3, "mean v {mv}");
    }

    #[test]
    fn horn_schunck_rejects_mismatched_frames() {
        let a = GrayImage::new(32, 32);
        let b = GrayImage::new(16, 32);
        assert!(HornSchunck::default().compute(&a, &b).is_err());
    }
}
