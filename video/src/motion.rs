//! Frame-to-frame motion masks.

use cvkit_imgproc::{absdiff, threshold, ThresholdType};
use image::GrayImage;

/// Binary motion mask from the absolute difference of two frames.
pub fn frame_difference(
    prev: &GrayImage,
    next: &GrayImage,
    thresh: u8,
) -> crate::Result<GrayImage> {
    let diff = absdiff(prev, next).map_err(|e| {
        cvkit_core::Error::DimensionMismatch(e.to_string())
    })?;
    Ok(threshold(&diff, thresh, 255, ThresholdType::Binary))
}

/// Running-average background model. The background adapts toward each new
/// frame with rate `alpha`; pixels deviating more than `threshold` are
/// foreground.
pub struct RunningAverage {
    pub alpha: f32,
    pub threshold: u8,
    background: Option<Vec<f32>>,
}

impl RunningAverage {
    pub fn new(alpha: f32, threshold: u8) -> Self {
        Self {
            alpha,
            threshold,
            background: None,
        }
    }

    /// Classify `frame` against the background and fold the frame into the
    /// model. The first frame initializes the background and yields an
    /// empty mask.
    pub fn apply(&mut self, frame: &GrayImage) -> GrayImage {
        let raw = frame.as_raw();
        let mut mask = GrayImage::new(frame.width(), frame.height());

        match &mut self.background {
            None => {
                self.background = Some(raw.iter().map(|&v| v as f32).collect());
            }
            Some(bg) => {
                debug_assert_eq!(bg.len(), raw.len());
                for (i, (&v, b)) in raw.iter().zip(bg.iter_mut()).enumerate() {
                    let fv = v as f32;
                    if (fv - *b).abs() > self.threshold as f32 {
                        mask.as_mut()[i] = 255;
                    }
                    *b = (1.0 - self.alpha) * *b + self.alpha * fv;
                }
            }
        }

        mask
    }

    pub fn reset(&mut self) {
        self.background = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn static_frames_produce_empty_mask() {
        let frame = GrayImage::from_pixel(16, 16, Luma([90]));
        let mask = frame_difference(&frame, &frame, 10).unwrap();
        assert!(mask.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn moving_block_detected() {
        let mut prev = GrayImage::from_pixel(32, 32, Luma([20]));
        let mut next = prev.clone();
        for y in 4..12 {
            for x in 4..12 {
                prev.put_pixel(x, y, Luma([220]));
                next.put_pixel(x + 8, y, Luma([220]));
            }
        }
        let mask = frame_difference(&prev, &next, 50).unwrap();
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(17, 5)[0], 255);
        assert_eq!(mask.get_pixel(28, 28)[0], 0);
    }

    #[test]
    fn running_average_flags_intruder_then_absorbs_it() {
        let bg_frame = GrayImage::from_pixel(16, 16, Luma([50]));
        let mut model = RunningAverage::new(0.2, 30);

        let first = model.apply(&bg_frame);
        assert!(first.as_raw().iter().all(|&v| v == 0));

        let mut intruder = bg_frame.clone();
        for y in 4..8 {
            for x in 4..8 {
                intruder.put_pixel(x, y, Luma([200]));
            }
        }
        let mask = model.apply(&intruder);
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(12, 12)[0], 0);

        // Keep showing the same frame; the model adapts until the region
        // stops registering as foreground.
        let mut absorbed = false;
        for _ in 0..40 {
            let m = model.apply(&intruder);
            if m.as_raw().iter().all(|&v| v == 0) {
                absorbed = true;
                break;
            }
        }
        assert!(absorbed);
    }
}
