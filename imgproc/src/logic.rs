//! Per-pixel arithmetic and bitwise operations on gray images.

use crate::{validate_same_size, Result};
use image::GrayImage;
use rayon::prelude::*;

fn binary_op(a: &GrayImage, b: &GrayImage, f: impl Fn(u8, u8) -> u8 + Sync) -> Result<GrayImage> {
    validate_same_size(a, b)?;
    let mut out = GrayImage::new(a.width(), a.height());
    out.as_mut()
        .par_iter_mut()
        .zip(a.as_raw().par_iter())
        .zip(b.as_raw().par_iter())
        .for_each(|((o, &va), &vb)| *o = f(va, vb));
    Ok(out)
}

pub fn bitwise_and(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x & y)
}

pub fn bitwise_or(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x | y)
}

pub fn bitwise_xor(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x ^ y)
}

pub fn bitwise_not(src: &GrayImage) -> GrayImage {
    let mut out = src.clone();
    out.as_mut().par_iter_mut().for_each(|p| *p = !*p);
    out
}

pub fn absdiff(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x.abs_diff(y))
}

pub fn add_saturating(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x.saturating_add(y))
}

pub fn subtract_saturating(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    binary_op(a, b, |x, y| x.saturating_sub(y))
}
