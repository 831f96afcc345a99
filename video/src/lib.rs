//! Motion estimation between frames: sparse and dense optical flow plus
//! simple background subtraction.

pub mod motion;
pub mod optical_flow;
pub mod pyramid;

pub use motion::*;
pub use optical_flow::*;
pub use pyramid::*;

pub use cvkit_core::{Error, Result};

/// Dense per-pixel flow field.
#[derive(Debug, Clone)]
pub struct MotionField {
    pub u: Vec<f32>,
    pub v: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl MotionField {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            u: vec![0.0; size],
            v: vec![0.0; size],
            width,
            height,
        }
    }

    pub fn get(&self, x: u32, y: u32) -> (f32, f32) {
        let idx = (y * self.width + x) as usize;
        (self.u[idx], self.v[idx])
    }

    pub fn mean_magnitude(&self) -> f32 {
        if self.u.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .u
            .iter()
            .zip(&self.v)
            .map(|(&u, &v)| (u * u + v * v).sqrt())
            .sum();
        sum / self.u.len() as f32
    }
}
