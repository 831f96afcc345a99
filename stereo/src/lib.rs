//! Stereo vision: disparity maps from rectified image pairs and depth
//! reprojection.

use image::GrayImage;

pub mod block_matching;
pub mod depth;

pub use block_matching::*;
pub use depth::*;

pub use cvkit_core::{Error, Result};

/// Stereo matching algorithm seam.
pub trait StereoMatcher {
    fn compute(&self, left: &GrayImage, right: &GrayImage) -> Result<DisparityMap>;
}

/// Disparity map over the left image, in (fractional) pixels.
#[derive(Debug, Clone)]
pub struct DisparityMap {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
    pub min_disparity: i32,
    pub max_disparity: i32,
}

impl DisparityMap {
    pub fn new(width: u32, height: u32, min_d: i32, max_d: i32) -> Self {
        let size = (width * height) as usize;
        Self {
            data: vec![0.0; size],
            width,
            height,
            min_disparity: min_d,
            max_disparity: max_d,
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Normalize into a gray image for inspection.
    pub fn to_gray(&self) -> GrayImage {
        let range = (self.max_disparity - self.min_disparity).max(1) as f32;
        let data: Vec<u8> = self
            .data
            .iter()
            .map(|&d| (((d - self.min_disparity as f32) / range) * 255.0).clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}
