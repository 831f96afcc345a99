use cvkit_imgproc::{gaussian_blur, resize, Interpolation};
use image::GrayImage;

/// Coarse-to-fine image pyramid; level 0 is the input resolution and each
/// level halves the previous one after a gaussian pre-filter.
pub fn build_pyramid(src: &GrayImage, levels: usize) -> Vec<GrayImage> {
    let mut pyramid = Vec::with_capacity(levels.max(1));
    pyramid.push(src.clone());
    for _ in 1..levels.max(1) {
        let prev = pyramid.last().expect("pyramid never empty");
        if prev.width() < 4 || prev.height() < 4 {
            break;
        }
        let blurred = gaussian_blur(prev, 1.0);
        let half = resize(
            &blurred,
            (prev.width() / 2).max(1),
            (prev.height() / 2).max(1),
            Interpolation::Linear,
        );
        pyramid.push(half);
    }
    pyramid
}
