use crate::Result;
use image::{GrayImage, RgbImage};
use std::path::Path;

/// Load an image as 8-bit grayscale.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    Ok(image::open(path)?.into_luma8())
}

/// Load an image as 8-bit RGB.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(image::open(path)?.into_rgb8())
}

pub fn save_gray<P: AsRef<Path>>(img: &GrayImage, path: P) -> Result<()> {
    img.save(path)?;
    Ok(())
}

pub fn save_rgb<P: AsRef<Path>>(img: &RgbImage, path: P) -> Result<()> {
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn save_and_reload_gray_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.png");

        let mut img = GrayImage::new(8, 8);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Luma([(i * 4) as u8]);
        }
        save_gray(&img, &path).unwrap();
        let back = load_gray(&path).unwrap();
        assert_eq!(back.as_raw(), img.as_raw());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_gray("/nonexistent/path/img.png").is_err());
    }
}
