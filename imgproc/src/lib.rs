pub mod color;
pub mod contours;
pub mod convolve;
pub mod corners;
pub mod edges;
pub mod geometry;
pub mod histogram;
pub mod hough;
pub mod logic;
pub mod morph;
pub mod resize;
pub mod skeleton;
pub mod threshold;

pub use color::*;
pub use contours::*;
pub use convolve::*;
pub use corners::*;
pub use edges::*;
pub use geometry::*;
pub use histogram::*;
pub use hough::*;
pub use logic::*;
pub use morph::*;
pub use resize::*;
pub use skeleton::*;
pub use threshold::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Algorithm error: {0}")]
    AlgorithmError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

pub fn validate_image_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImgprocError::DimensionMismatch(
            "Image dimensions must be non-zero".into(),
        ));
    }
    Ok(())
}

fn validate_same_size(a: &image::GrayImage, b: &image::GrayImage) -> Result<()> {
    if a.dimensions() != b.dimensions() {
        return Err(ImgprocError::DimensionMismatch(format!(
            "{}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    Ok(())
}
