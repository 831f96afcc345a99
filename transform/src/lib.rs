//! Frequency-domain transforms on image planes.
//!
//! All routines operate on row-major f32 planes; helpers convert from and
//! back to `GrayImage` at the boundaries.

pub mod dct;
pub mod dft;
pub mod plane;
pub mod wavelet;

pub use dct::*;
pub use dft::*;
pub use plane::*;
pub use wavelet::*;

pub use cvkit_core::{Error, Result};
