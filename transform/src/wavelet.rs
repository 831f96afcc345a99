//! Multi-level 2D Haar wavelet transform with shrinkage denoising.
//!
//! The analysis uses the in-place pyramid layout: after `levels`
//! decompositions the top-left `(w >> levels) x (h >> levels)` block holds
//! the approximation and each level's horizontal/vertical/diagonal detail
//! bands sit at their offset blocks.

use crate::Plane;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shrinkage {
    None,
    Hard,
    Soft,
    Garrote,
}

fn sgn(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn hard_shrink(d: f32, t: f32) -> f32 {
    if d.abs() > t {
        d
    } else {
        0.0
    }
}

fn soft_shrink(d: f32, t: f32) -> f32 {
    if d.abs() > t {
        sgn(d) * (d.abs() - t)
    } else {
        0.0
    }
}

fn garrote_shrink(d: f32, t: f32) -> f32 {
    if d.abs() > t {
        d - (t * t) / d
    } else {
        0.0
    }
}

fn shrink(d: f32, shrinkage: Shrinkage, t: f32) -> f32 {
    match shrinkage {
        Shrinkage::None => d,
        Shrinkage::Hard => hard_shrink(d, t),
        Shrinkage::Soft => soft_shrink(d, t),
        Shrinkage::Garrote => garrote_shrink(d, t),
    }
}

fn check_divisible(plane: &Plane, levels: usize) -> crate::Result<()> {
    if levels == 0 {
        return Err(crate::Error::InvalidInput(
            "levels must be >= 1".into(),
        ));
    }
    let div = 1usize << levels;
    if plane.width % div != 0 || plane.height % div != 0 {
        return Err(crate::Error::DimensionMismatch(format!(
            "{}x{} not divisible by 2^{}",
            plane.width, plane.height, levels
        )));
    }
    Ok(())
}

/// Forward Haar analysis over `levels` decomposition levels.
pub fn haar_forward(plane: &Plane, levels: usize) -> crate::Result<Plane> {
    check_divisible(plane, levels)?;
    let width = plane.width;
    let height = plane.height;
    let mut src = plane.clone();
    let mut dst = plane.clone();

    for k in 0..levels {
        let sub_h = height >> (k + 1);
        let sub_w = width >> (k + 1);
        for y in 0..sub_h {
            for x in 0..sub_w {
                let a = src.get(2 * x, 2 * y);
                let b = src.get(2 * x + 1, 2 * y);
                let c = src.get(2 * x, 2 * y + 1);
                let d = src.get(2 * x + 1, 2 * y + 1);

                // approximation and the three detail bands
                dst.set(x, y, (a + b + c + d) * 0.5);
                dst.set(x + sub_w, y, (a + c - b - d) * 0.5);
                dst.set(x, y + sub_h, (a + b - c - d) * 0.5);
                dst.set(x + sub_w, y + sub_h, (a - b - c + d) * 0.5);
            }
        }
        src.data.copy_from_slice(&dst.data);
    }

    Ok(dst)
}

/// Inverse Haar synthesis, optionally shrinking detail coefficients with
/// threshold `t` before each reconstruction step.
pub fn haar_inverse(
    coeffs: &Plane,
    levels: usize,
    shrinkage: Shrinkage,
    t: f32,
) -> crate::Result<Plane> {
    check_divisible(coeffs, levels)?;
    let width = coeffs.width;
    let height = coeffs.height;
    let mut src = coeffs.clone();
    let mut dst = coeffs.clone();

    for k in (1..=levels).rev() {
        let sub_h = height >> k;
        let sub_w = width >> k;
        for y in 0..sub_h {
            for x in 0..sub_w {
                let c = src.get(x, y);
                let dh = shrink(src.get(x + sub_w, y), shrinkage, t);
                let dv = shrink(src.get(x, y + sub_h), shrinkage, t);
                let dd = shrink(src.get(x + sub_w, y + sub_h), shrinkage, t);

                dst.set(2 * x, 2 * y, 0.5 * (c + dh + dv + dd));
                dst.set(2 * x + 1, 2 * y, 0.5 * (c - dh + dv - dd));
                dst.set(2 * x, 2 * y + 1, 0.5 * (c + dh - dv - dd));
                dst.set(2 * x + 1, 2 * y + 1, 0.5 * (c - dh - dv + dd));
            }
        }
        // Propagate the reconstructed level as the next approximation.
        let rec_w = width >> (k - 1);
        let rec_h = height >> (k - 1);
        for y in 0..rec_h {
            for x in 0..rec_w {
                let v = dst.get(x, y);
                src.set(x, y, v);
            }
        }
    }

    Ok(dst)
}

/// Wavelet shrinkage denoising: analyze, shrink details, reconstruct.
pub fn denoise(plane: &Plane, levels: usize, shrinkage: Shrinkage, t: f32) -> crate::Result<Plane> {
    let coeffs = haar_forward(plane, levels)?;
    haar_inverse(&coeffs, levels, shrinkage, t)
}
