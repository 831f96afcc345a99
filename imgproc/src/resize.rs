use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Linear,
}

pub fn resize(src: &GrayImage, width: u32, height: u32, interpolation: Interpolation) -> GrayImage {
    if width == 0 || height == 0 {
        return GrayImage::new(0, 0);
    }

    match interpolation {
        Interpolation::Nearest => resize_nearest(src, width, height),
        Interpolation::Linear => resize_linear(src, width, height),
    }
}

fn resize_nearest(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let mut dst = GrayImage::new(width, height);
    let scale_x = src.width() as f32 / width as f32;
    let scale_y = src.height() as f32 / height as f32;
    let src_w = src.width() as usize;
    let raw = src.as_raw();

    dst.as_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = ((y as f32 + 0.5) * scale_y - 0.5)
                .round()
                .clamp(0.0, src.height() as f32 - 1.0) as usize;
            for (x, out) in row.iter_mut().enumerate() {
                let sx = ((x as f32 + 0.5) * scale_x - 0.5)
                    .round()
                    .clamp(0.0, src.width() as f32 - 1.0) as usize;
                *out = raw[sy * src_w + sx];
            }
        });

    dst
}

fn resize_linear(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let mut dst = GrayImage::new(width, height);
    let scale_x = src.width() as f32 / width as f32;
    let scale_y = src.height() as f32 / height as f32;
    let src_w = src.width() as usize;
    let src_h = src.height() as usize;
    let raw = src.as_raw();

    dst.as_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let fy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
            let y0 = (fy.floor() as usize).min(src_h - 1);
            let y1 = (y0 + 1).min(src_h - 1);
            let wy = fy - y0 as f32;

            for (x, out) in row.iter_mut().enumerate() {
                let fx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
                let x0 = (fx.floor() as usize).min(src_w - 1);
                let x1 = (x0 + 1).min(src_w - 1);
                let wx = fx - x0 as f32;

                let v00 = raw[y0 * src_w + x0] as f32;
                let v10 = raw[y0 * src_w + x1] as f32;
                let v01 = raw[y1 * src_w + x0] as f32;
                let v11 = raw[y1 * src_w + x1] as f32;

                let top = v00 * (1.0 - wx) + v10 * wx;
                let bottom = v01 * (1.0 - wx) + v11 * wx;
                *out = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
            }
        });

    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn identity_resize_is_noop() {
        let mut img = GrayImage::new(8, 6);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Luma([(i * 5 % 256) as u8]);
        }
        for interp in [Interpolation::Nearest, Interpolation::Linear] {
            let out = resize(&img, 8, 6, interp);
            assert_eq!(out.as_raw(), img.as_raw());
        }
    }

    #[test]
    fn upscale_doubles_dimensions() {
        let img = GrayImage::from_pixel(4, 4, Luma([90]));
        let out = resize(&img, 8, 8, Interpolation::Linear);
        assert_eq!(out.dimensions(), (8, 8));
        assert!(out.as_raw().iter().all(|&v| v == 90));
    }

    #[test]
    fn downscale_averages_blocks() {
        let mut img = GrayImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                img.put_pixel(x, y, Luma([if x < 2 { 0 } else { 200 }]));
            }
        }
        let out = resize(&img, 2, 2, Interpolation::Linear);
        assert!(out.get_pixel(0, 0)[0] < 100);
        assert!(out.get_pixel(1, 0)[0] > 100);
    }
}
