use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// BT.601 luma weights, same rounding as the fixed-point path below.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

pub fn convert_rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let count = (w * h) as usize;
    let mut gray_data = vec![0u8; count];
    let rgb_data = rgb.as_raw();

    gray_data
        .par_iter_mut()
        .zip(rgb_data.par_chunks(3))
        .for_each(|(g, px)| {
            let v = px[0] as f32 * LUMA_R + px[1] as f32 * LUMA_G + px[2] as f32 * LUMA_B;
            *g = v.round().clamp(0.0, 255.0) as u8;
        });

    GrayImage::from_raw(w, h, gray_data).expect("buffer sized from dimensions")
}

pub fn convert_gray_to_rgb(gray: &GrayImage) -> RgbImage {
    let (w, h) = gray.dimensions();
    let count = (w * h) as usize;
    let mut rgb_data = vec![0u8; count * 3];
    let gray_data = gray.as_raw();

    rgb_data
        .par_chunks_mut(3)
        .zip(gray_data.par_iter())
        .for_each(|(rgb_pixel, &g)| {
            rgb_pixel[0] = g;
            rgb_pixel[1] = g;
            rgb_pixel[2] = g;
        });

    RgbImage::from_raw(w, h, rgb_data).expect("buffer sized from dimensions")
}

pub fn to_gray(img: &RgbImage) -> GrayImage {
    convert_rgb_to_gray(img)
}

pub fn to_rgb(img: &GrayImage) -> RgbImage {
    convert_gray_to_rgb(img)
}

pub fn adjust_brightness(src: &GrayImage, factor: f32) -> GrayImage {
    let mut output = src.clone();
    output.as_mut().par_iter_mut().for_each(|p| {
        *p = (*p as f32 * factor).clamp(0.0, 255.0) as u8;
    });
    output
}

pub fn adjust_contrast(src: &GrayImage, factor: f32) -> GrayImage {
    let mean = compute_mean_intensity(src);
    let mut output = src.clone();
    output.as_mut().par_iter_mut().for_each(|p| {
        *p = ((*p as f32 - mean) * factor + mean).clamp(0.0, 255.0) as u8;
    });
    output
}

pub fn compute_mean_intensity(src: &GrayImage) -> f32 {
    let raw = src.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.par_iter().map(|&p| p as u64).sum();
    (sum as f32) / (raw.len() as f32)
}

pub fn invert(src: &GrayImage) -> GrayImage {
    let mut output = src.clone();
    output.as_mut().par_iter_mut().for_each(|p| {
        *p = 255 - *p;
    });
    output
}
