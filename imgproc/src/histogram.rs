use image::GrayImage;
use rayon::prelude::*;

pub fn compute_histogram(image: &GrayImage) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for pixel in image.pixels() {
        hist[pixel[0] as usize] += 1;
    }
    hist
}

pub fn compute_histogram_normalized(image: &GrayImage) -> [f32; 256] {
    let hist = compute_histogram(image);
    let total = (image.width() * image.height()).max(1);
    hist.map(|h| h as f32 / total as f32)
}

pub fn compute_cdf(hist: &[u32; 256]) -> [u32; 256] {
    let mut cdf = [0u32; 256];
    cdf[0] = hist[0];
    for i in 1..256 {
        cdf[i] = cdf[i - 1] + hist[i];
    }
    cdf
}

pub fn histogram_equalization(image: &GrayImage) -> GrayImage {
    let hist = compute_histogram(image);
    let cdf = compute_cdf(&hist);

    let cdf_min = cdf.iter().find(|&&x| x > 0).copied().unwrap_or(0);
    let total = image.width() * image.height();

    let mut lut = [0u8; 256];
    if total > cdf_min {
        let denom = (total - cdf_min) as f32;
        for i in 0..256 {
            lut[i] = ((cdf[i].saturating_sub(cdf_min)) as f32 / denom * 255.0).round() as u8;
        }
    } else {
        // Constant image: identity mapping
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
    }

    apply_lut(image, &lut)
}

pub fn apply_lut(image: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut output = image.clone();
    output.as_mut().par_iter_mut().for_each(|p| {
        *p = lut[*p as usize];
    });
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistCompareMethod {
    Correlation,
    ChiSquare,
    Intersection,
    Bhattacharyya,
}

/// Compare two normalized histograms.
///
/// Correlation and Intersection are similarities (higher is closer);
/// Chi-Square and Bhattacharyya are distances (lower is closer).
pub fn compare_histograms(h1: &[f32; 256], h2: &[f32; 256], method: HistCompareMethod) -> f64 {
    match method {
        HistCompareMethod::Correlation => {
            let mean1: f64 = h1.iter().map(|&v| v as f64).sum::<f64>() / 256.0;
            let mean2: f64 = h2.iter().map(|&v| v as f64).sum::<f64>() / 256.0;
            let mut num = 0.0;
            let mut den1 = 0.0;
            let mut den2 = 0.0;
            for i in 0..256 {
                let d1 = h1[i] as f64 - mean1;
                let d2 = h2[i] as f64 - mean2;
                num += d1 * d2;
                den1 += d1 * d1;
                den2 += d2 * d2;
            }
            let den = (den1 * den2).sqrt();
            if den > 0.0 {
                num / den
            } else {
                1.0
            }
        }
        HistCompareMethod::ChiSquare => {
            let mut sum = 0.0;
            for i in 0..256 {
                let a = h1[i] as f64;
                let b = h2[i] as f64;
                if a > 0.0 {
                    let d = a - b;
                    sum += d * d / a;
                }
            }
            sum
        }
        HistCompareMethod::Intersection => {
            let mut sum = 0.0;
            for i in 0..256 {
                sum += h1[i].min(h2[i]) as f64;
            }
            sum
        }
        HistCompareMethod::Bhattacharyya => {
            let sum1: f64 = h1.iter().map(|&v| v as f64).sum();
            let sum2: f64 = h2.iter().map(|&v| v as f64).sum();
            if sum1 <= 0.0 || sum2 <= 0.0 {
                return 1.0;
            }
            let mut bc = 0.0;
            for i in 0..256 {
                bc += ((h1[i] as f64) * (h2[i] as f64)).sqrt();
            }
            (1.0 - bc / (sum1 * sum2).sqrt()).max(0.0).sqrt()
        }
    }
}

/// Histogram specification: build a monotone LUT mapping the source
/// distribution onto the reference distribution by pairing their CDFs.
pub fn match_histogram_lut(source: &GrayImage, reference: &GrayImage) -> [u8; 256] {
    let src_cdf = normalized_cdf(source);
    let ref_cdf = normalized_cdf(reference);

    let mut lut = [0u8; 256];
    let mut last = 0usize;
    for j in 0..256 {
        let f1 = src_cdf[j];
        for (k, &f2) in ref_cdf.iter().enumerate().skip(last) {
            if (f2 - f1).abs() < 1e-6 || f2 > f1 {
                lut[j] = k as u8;
                last = k;
                break;
            }
            // CDF saturates at 1; everything above maps to the top bin.
            if k == 255 {
                lut[j] = 255;
            }
        }
    }
    lut
}

/// Remap `source` so its histogram approximates that of `reference`.
pub fn match_histogram(source: &GrayImage, reference: &GrayImage) -> GrayImage {
    let lut = match_histogram_lut(source, reference);
    apply_lut(source, &lut)
}

fn normalized_cdf(image: &GrayImage) -> [f64; 256] {
    let hist = compute_histogram(image);
    let cdf = compute_cdf(&hist);
    let total = cdf[255].max(1) as f64;
    let mut out = [0.0f64; 256];
    for i in 0..256 {
        out[i] = cdf[i] as f64 / total;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn two_level_image(low: u8, high: u8) -> GrayImage {
        let mut img = GrayImage::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                img.put_pixel(x, y, Luma([if x < 8 { low } else { high }]));
            }
        }
        img
    }

    #[test]
    fn histogram_counts_pixels() {
        let img = two_level_image(10, 200);
        let hist = compute_histogram(&img);
        assert_eq!(hist[10], 128);
        assert_eq!(hist[200], 128);
        assert_eq!(hist.iter().sum::<u32>(), 256);
    }

    #[test]
    fn equalization_spreads_levels() {
        let img = two_level_image(100, 120);
        let out = histogram_equalization(&img);
        let hist = compute_histogram(&out);
        // Two occupied bins pushed to the extremes of the range.
        assert!(hist[0] > 0 || hist[1] > 0);
        assert!(hist[255] > 0);
    }

    #[test]
    fn equalization_constant_image_unchanged() {
        let img = GrayImage::from_pixel(8, 8, Luma([77]));
        let out = histogram_equalization(&img);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn identical_histograms_compare_as_equal() {
        let img = two_level_image(30, 220);
        let h = compute_histogram_normalized(&img);
        assert!((compare_histograms(&h, &h, HistCompareMethod::Correlation) - 1.0).abs() < 1e-9);
        assert!(compare_histograms(&h, &h, HistCompareMethod::ChiSquare) < 1e-9);
        assert!(compare_histograms(&h, &h, HistCompareMethod::Bhattacharyya) < 1e-6);
        assert!((compare_histograms(&h, &h, HistCompareMethod::Intersection) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn disjoint_histograms_compare_as_far() {
        let a = compute_histogram_normalized(&two_level_image(10, 20));
        let b = compute_histogram_normalized(&two_level_image(200, 230));
        assert!(compare_histograms(&a, &b, HistCompareMethod::Intersection) < 1e-6);
        assert!(compare_histograms(&a, &b, HistCompareMethod::Bhattacharyya) > 0.9);
    }

    #[test]
    fn matching_moves_levels_toward_reference() {
        let source = two_level_image(50, 100);
        let reference = two_level_image(150, 250);
        let out = match_histogram(&source, &reference);
        let hist = compute_histogram(&out);
        assert_eq!(hist[150], 128);
        assert_eq!(hist[250], 128);
    }

    #[test]
    fn matching_lut_is_monotone() {
        let source = two_level_image(50, 100);
        let reference = two_level_image(150, 250);
        let lut = match_histogram_lut(&source, &reference);
        for i in 1..256 {
            assert!(lut[i] >= lut[i - 1]);
        }
    }
}
