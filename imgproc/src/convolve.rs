use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct Kernel {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Kernel {
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_slice(data: &[f32], width: usize, height: usize) -> Self {
        Self::new(data.to_vec(), width, height)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn normalize(&mut self) {
        let sum: f32 = self.data.iter().sum();
        if sum != 0.0 {
            for v in &mut self.data {
                *v /= sum;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    Constant(u8),
    Replicate,
    Reflect,
    Reflect101,
    Wrap,
}

pub fn box_kernel(size: usize) -> Kernel {
    let value = 1.0 / (size * size) as f32;
    Kernel::new(vec![value; size * size], size, size)
}

pub fn gaussian_kernel(sigma: f32, size: usize) -> Kernel {
    let mut data = Vec::with_capacity(size * size);
    let center = size / 2;
    let sigma2 = sigma * sigma;
    let mut sum = 0.0f32;

    for y in 0..size {
        for x in 0..size {
            let dx = (x as isize - center as isize) as f32;
            let dy = (y as isize - center as isize) as f32;
            let v = (-(dx * dx + dy * dy) / (2.0 * sigma2)).exp();
            data.push(v);
            sum += v;
        }
    }

    for v in &mut data {
        *v /= sum;
    }

    Kernel::new(data, size, size)
}

pub fn gaussian_kernel_1d(sigma: f32, size: usize) -> Vec<f32> {
    assert!(size % 2 == 1, "gaussian kernel size must be odd");
    let mut kernel = Vec::with_capacity(size);
    let center = (size / 2) as isize;
    let sigma2 = sigma * sigma;
    let mut sum = 0.0f32;

    for i in 0..size {
        let x = (i as isize - center) as f32;
        let v = (-(x * x) / (2.0 * sigma2)).exp();
        kernel.push(v);
        sum += v;
    }

    if sum != 0.0 {
        for v in &mut kernel {
            *v /= sum;
        }
    }

    kernel
}

pub fn laplacian_kernel() -> Kernel {
    Kernel::from_slice(&[0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0], 3, 3)
}

pub(crate) fn map_coord(coord: isize, len: usize, mode: BorderMode) -> Option<usize> {
    let n = len as isize;
    if n <= 0 {
        return None;
    }

    match mode {
        BorderMode::Constant(_) => {
            if coord < 0 || coord >= n {
                None
            } else {
                Some(coord as usize)
            }
        }
        BorderMode::Replicate => Some(coord.clamp(0, n - 1) as usize),
        BorderMode::Wrap => {
            let mut c = coord % n;
            if c < 0 {
                c += n;
            }
            Some(c as usize)
        }
        BorderMode::Reflect => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n;
            let mut c = coord % period;
            if c < 0 {
                c += period;
            }
            if c >= n {
                c = period - c - 1;
            }
            Some(c as usize)
        }
        BorderMode::Reflect101 => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n - 2;
            let mut c = coord % period;
            if c < 0 {
                c += period;
            }
            if c >= n {
                c = period - c;
            }
            Some(c as usize)
        }
    }
}

fn sample(data: &[u8], width: usize, height: usize, x: isize, y: isize, mode: BorderMode) -> f32 {
    match (map_coord(x, width, mode), map_coord(y, height, mode)) {
        (Some(ix), Some(iy)) => data[iy * width + ix] as f32,
        _ => match mode {
            BorderMode::Constant(v) => v as f32,
            _ => 0.0,
        },
    }
}

pub fn convolve(image: &GrayImage, kernel: &Kernel) -> GrayImage {
    convolve_with_border(image, kernel, BorderMode::Replicate)
}

pub fn convolve_with_border(image: &GrayImage, kernel: &Kernel, border: BorderMode) -> GrayImage {
    let mut output = GrayImage::new(image.width(), image.height());
    convolve_into(image, &mut output, kernel, border);
    output
}

pub fn convolve_into(
    image: &GrayImage,
    output: &mut GrayImage,
    kernel: &Kernel,
    border: BorderMode,
) {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let data = image.as_raw();
    let (kw, kh) = kernel.size();
    let kcx = (kw / 2) as isize;
    let kcy = (kh / 2) as isize;

    output
        .as_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = 0.0f32;
                for ky in 0..kh {
                    for kx in 0..kw {
                        let sx = x as isize + kx as isize - kcx;
                        let sy = y as isize + ky as isize - kcy;
                        acc += kernel.get(kx, ky) * sample(data, width, height, sx, sy, border);
                    }
                }
                row[x] = acc.round().clamp(0.0, 255.0) as u8;
            }
        });
}

/// Separable convolution: a horizontal pass with `kx` then a vertical pass
/// with `ky`, keeping the intermediate in f32.
pub fn separable_convolve(
    image: &GrayImage,
    kx: &[f32],
    ky: &[f32],
    border: BorderMode,
) -> GrayImage {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let data = image.as_raw();
    let cx = (kx.len() / 2) as isize;
    let cy = (ky.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (i, &k) in kx.iter().enumerate() {
                    let sx = x as isize + i as isize - cx;
                    acc += k * sample(data, width, height, sx, y as isize, border);
                }
                row[x] = acc;
            }
        });

    let mut output = GrayImage::new(image.width(), image.height());
    output
        .as_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (i, &k) in ky.iter().enumerate() {
                    let sy = y as isize + i as isize - cy;
                    let v = match map_coord(sy, height, border) {
                        Some(iy) => horizontal[iy * width + x],
                        None => match border {
                            BorderMode::Constant(v) => v as f32,
                            _ => 0.0,
                        },
                    };
                    acc += k * v;
                }
                row[x] = acc.round().clamp(0.0, 255.0) as u8;
            }
        });

    output
}

/// Separable variant that keeps the signed f32 result instead of clamping
/// to u8. Used by gradient filters.
pub fn separable_convolve_f32(
    image: &GrayImage,
    kx: &[f32],
    ky: &[f32],
    border: BorderMode,
) -> Vec<f32> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let data = image.as_raw();
    let cx = (kx.len() / 2) as isize;
    let cy = (ky.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (i, &k) in kx.iter().enumerate() {
                    let sx = x as isize + i as isize - cx;
                    acc += k * sample(data, width, height, sx, y as isize, border);
                }
                row[x] = acc;
            }
        });

    let mut output = vec![0.0f32; width * height];
    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (i, &k) in ky.iter().enumerate() {
                    let sy = y as isize + i as isize - cy;
                    if let Some(iy) = map_coord(sy, height, border) {
                        acc += k * horizontal[iy * width + x];
                    }
                }
                row[x] = acc;
            }
        });

    output
}

pub fn box_blur(src: &GrayImage, size: usize) -> GrayImage {
    let k = vec![1.0 / size as f32; size];
    separable_convolve(src, &k, &k, BorderMode::Replicate)
}

pub fn gaussian_blur(src: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_with_border(src, sigma, BorderMode::Reflect101)
}

pub fn gaussian_blur_with_border(src: &GrayImage, sigma: f32, border: BorderMode) -> GrayImage {
    // Kernel radius of 3 sigma covers 99.7% of the distribution.
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let size = 2 * radius + 1;
    let k = gaussian_kernel_1d(sigma, size);
    separable_convolve(src, &k, &k, border)
}

pub fn median_blur(src: &GrayImage, size: usize) -> GrayImage {
    assert!(size % 2 == 1, "median kernel size must be odd");
    let width = src.width() as usize;
    let height = src.height() as usize;
    let data = src.as_raw();
    let radius = (size / 2) as isize;

    let mut output = GrayImage::new(src.width(), src.height());
    output
        .as_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut window = Vec::with_capacity(size * size);
            for x in 0..width {
                window.clear();
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let sx = map_coord(x as isize + dx, width, BorderMode::Replicate)
                            .expect("replicate always maps");
                        let sy = map_coord(y as isize + dy, height, BorderMode::Replicate)
                            .expect("replicate always maps");
                        window.push(data[sy * width + sx]);
                    }
                }
                window.sort_unstable();
                row[x] = window[window.len() / 2];
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn identity_kernel_preserves_image() {
        let mut img = GrayImage::new(8, 8);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Luma([(i * 3 % 256) as u8]);
        }
        let identity = Kernel::from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 3, 3);
        let out = convolve(&img, &identity);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn gaussian_kernel_sums_to_one() {
        let k = gaussian_kernel(1.5, 7);
        let sum: f32 = k.data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn box_blur_flattens_impulse() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        let out = box_blur(&img, 3);
        // 255/9 = 28.3, spread over the 3x3 neighborhood
        assert_eq!(out.get_pixel(4, 4)[0], 28);
        assert_eq!(out.get_pixel(3, 3)[0], 28);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn median_blur_removes_salt_noise() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([100]));
        img.put_pixel(4, 4, Luma([255]));
        let out = median_blur(&img, 3);
        assert_eq!(out.get_pixel(4, 4)[0], 100);
    }

    #[test]
    fn separable_matches_full_gaussian() {
        let mut img = GrayImage::new(16, 16);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Luma([(i * 7 % 256) as u8]);
        }
        let k1 = gaussian_kernel_1d(1.0, 5);
        let sep = separable_convolve(&img, &k1, &k1, BorderMode::Replicate);

        let mut full_data = Vec::with_capacity(25);
        for &ky in &k1 {
            for &kx in &k1 {
                full_data.push(kx * ky);
            }
        }
        let full = convolve_with_border(
            &img,
            &Kernel::new(full_data, 5, 5),
            BorderMode::Replicate,
        );

        for (a, b) in sep.as_raw().iter().zip(full.as_raw()) {
            assert!((*a as i16 - *b as i16).abs() <= 1);
        }
    }

    #[test]
    fn border_modes_map_coords() {
        assert_eq!(map_coord(-1, 5, BorderMode::Replicate), Some(0));
        assert_eq!(map_coord(-1, 5, BorderMode::Reflect), Some(0));
        assert_eq!(map_coord(-1, 5, BorderMode::Reflect101), Some(1));
        assert_eq!(map_coord(-1, 5, BorderMode::Wrap), Some(4));
        assert_eq!(map_coord(-1, 5, BorderMode::Constant(0)), None);
        assert_eq!(map_coord(5, 5, BorderMode::Reflect), Some(4));
        assert_eq!(map_coord(5, 5, BorderMode::Reflect101), Some(3));
    }
}
