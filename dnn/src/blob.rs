use cvkit_imgproc::{resize, Interpolation};
use image::{GrayImage, RgbImage};

/// Preprocessing parameters for blob conversion, mirroring the usual
/// detector input contracts.
#[derive(Debug, Clone, Copy)]
pub struct BlobParams {
    /// Multiplied into every sample after mean subtraction (1/255 for
    /// most YOLO variants).
    pub scale: f32,
    /// Per-channel mean, in the input image's RGB order.
    pub mean: [f32; 3],
    /// Swap the red and blue channels (RGB input, BGR-trained network).
    pub swap_rb: bool,
    /// Network input size (width, height).
    pub size: (u32, u32),
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.0; 3],
            swap_rb: false,
            size: (416, 416),
        }
    }
}

/// Convert an RGB image into a CHW f32 blob: resize to the network size,
/// subtract the mean, scale, optionally swap R/B.
pub fn blob_from_rgb_image(img: &RgbImage, params: &BlobParams) -> Vec<f32> {
    let (bw, bh) = params.size;

    // Per-channel bilinear resize through gray planes.
    let mut channels: Vec<GrayImage> = (0..3)
        .map(|c| {
            let mut plane = GrayImage::new(img.width(), img.height());
            for (src, dst) in img.pixels().zip(plane.pixels_mut()) {
                dst[0] = src[c];
            }
            resize(&plane, bw, bh, Interpolation::Linear)
        })
        .collect();

    if params.swap_rb {
        channels.swap(0, 2);
    }

    let area = (bw * bh) as usize;
    let mut blob = vec![0.0f32; 3 * area];
    for (c, plane) in channels.iter().enumerate() {
        let mean = match (params.swap_rb, c) {
            (true, 0) => params.mean[2],
            (true, 2) => params.mean[0],
            (_, i) => params.mean[i],
        };
        for (i, &v) in plane.as_raw().iter().enumerate() {
            blob[c * area + i] = (v as f32 - mean) * params.scale;
        }
    }
    blob
}

/// Single-channel variant used by grayscale models.
pub fn blob_from_gray_image(img: &GrayImage, size: (u32, u32), scale: f32) -> Vec<f32> {
    let resized = resize(img, size.0, size.1, Interpolation::Linear);
    resized.as_raw().iter().map(|&v| v as f32 * scale).collect()
}

/// Map one blob channel back to an image for inspection.
pub fn blob_to_gray_image(blob: &[f32], width: u32, height: u32) -> GrayImage {
    let area = (width * height) as usize;
    let mut raw = Vec::with_capacity(area);
    for &v in blob.iter().take(area) {
        raw.push((v * 255.0).clamp(0.0, 255.0) as u8);
    }
    raw.resize(area, 0);
    GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn blob_has_chw_layout_and_scaled_values() {
        let mut img = RgbImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = Rgb([255, 128, 0]);
        }
        let params = BlobParams {
            scale: 1.0 / 255.0,
            mean: [0.0; 3],
            swap_rb: false,
            size: (4, 4),
        };
        let blob = blob_from_rgb_image(&img, &params);
        assert_eq!(blob.len(), 3 * 16);
        assert!((blob[0] - 1.0).abs() < 1e-6);
        assert!((blob[16] - 128.0 / 255.0).abs() < 1e-6);
        assert!(blob[32].abs() < 1e-6);
    }

    #[test]
    fn swap_rb_exchanges_channels() {
        let mut img = RgbImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = Rgb([200, 50, 10]);
        }
        let params = BlobParams {
            swap_rb: true,
            size: (2, 2),
            ..Default::default()
        };
        let blob = blob_from_rgb_image(&img, &params);
        // Channel 0 now carries blue.
        assert!((blob[0] - 10.0 / 255.0).abs() < 1e-6);
        assert!((blob[8] - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn mean_subtraction_applies_before_scale() {
        let mut img = RgbImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = Rgb([100, 100, 100]);
        }
        let params = BlobParams {
            scale: 0.5,
            mean: [60.0, 60.0, 60.0],
            swap_rb: false,
            size: (2, 2),
        };
        let blob = blob_from_rgb_image(&img, &params);
        assert!(blob.iter().all(|&v| (v - 20.0).abs() < 1e-5));
    }

    #[test]
    fn gray_blob_roundtrip() {
        let mut img = GrayImage::new(4, 4);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = image::Luma([(i * 16) as u8]);
        }
        let blob = blob_from_gray_image(&img, (4, 4), 1.0 / 255.0);
        let back = blob_to_gray_image(&blob, 4, 4);
        for (a, b) in img.as_raw().iter().zip(back.as_raw()) {
            assert!((*a as i16 - *b as i16).abs() <= 1);
        }
    }
}
