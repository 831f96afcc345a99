use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphType {
    Erode,
    Dilate,
    Open,
    Close,
    Gradient,
    TopHat,
    BlackHat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphShape {
    Rectangle,
    Ellipse,
    Cross,
}

/// Build a structuring element as a list of (dx, dy) offsets from the anchor.
pub fn create_morph_kernel(shape: MorphShape, width: u32, height: u32) -> Vec<(i32, i32)> {
    let mut kernel = Vec::new();
    let cx = width as i32 / 2;
    let cy = height as i32 / 2;

    match shape {
        MorphShape::Rectangle => {
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    kernel.push((x - cx, y - cy));
                }
            }
        }
        MorphShape::Ellipse => {
            let rx = width as f32 / 2.0;
            let ry = height as f32 / 2.0;

            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    let dx = (x - cx) as f32;
                    let dy = (y - cy) as f32;
                    if (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0 {
                        kernel.push((x - cx, y - cy));
                    }
                }
            }
        }
        MorphShape::Cross => {
            for i in -(width as i32 / 2)..=(width as i32 / 2) {
                kernel.push((i, 0));
            }
            for i in -(height as i32 / 2)..=(height as i32 / 2) {
                if i != 0 {
                    kernel.push((0, i));
                }
            }
        }
    }

    kernel
}

fn morph_once(src: &GrayImage, kernel: &[(i32, i32)], is_dilate: bool) -> GrayImage {
    let mut output = GrayImage::new(src.width(), src.height());
    let width = src.width() as i32;
    let height = src.height() as i32;

    for y in 0..height {
        for x in 0..width {
            let mut extreme = if is_dilate { 0u8 } else { 255u8 };

            for &(kx, ky) in kernel {
                let px = x + kx;
                let py = y + ky;

                if px >= 0 && px < width && py >= 0 && py < height {
                    let val = src.get_pixel(px as u32, py as u32)[0];
                    extreme = if is_dilate {
                        extreme.max(val)
                    } else {
                        extreme.min(val)
                    };
                }
            }

            output.put_pixel(x as u32, y as u32, image::Luma([extreme]));
        }
    }

    output
}

pub fn dilate(src: &GrayImage, kernel: &[(i32, i32)], iterations: u32) -> GrayImage {
    let mut output = src.clone();
    for _ in 0..iterations {
        output = morph_once(&output, kernel, true);
    }
    output
}

pub fn erode(src: &GrayImage, kernel: &[(i32, i32)], iterations: u32) -> GrayImage {
    let mut output = src.clone();
    for _ in 0..iterations {
        output = morph_once(&output, kernel, false);
    }
    output
}

pub fn morph(
    src: &GrayImage,
    morph_type: MorphType,
    kernel: &[(i32, i32)],
    iterations: u32,
) -> GrayImage {
    match morph_type {
        MorphType::Erode => erode(src, kernel, iterations),
        MorphType::Dilate => dilate(src, kernel, iterations),
        MorphType::Open => {
            let eroded = erode(src, kernel, iterations);
            dilate(&eroded, kernel, iterations)
        }
        MorphType::Close => {
            let dilated = dilate(src, kernel, iterations);
            erode(&dilated, kernel, iterations)
        }
        MorphType::Gradient => {
            let dilated = dilate(src, kernel, iterations);
            let eroded = erode(src, kernel, iterations);
            subtract(&dilated, &eroded)
        }
        MorphType::TopHat => {
            let opened = morph(src, MorphType::Open, kernel, iterations);
            subtract(src, &opened)
        }
        MorphType::BlackHat => {
            let closed = morph(src, MorphType::Close, kernel, iterations);
            subtract(&closed, src)
        }
    }
}

fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut output = GrayImage::new(a.width(), a.height());

    for (i, pixel) in output.pixels_mut().enumerate() {
        let va = a.as_raw()[i];
        let vb = b.as_raw()[i];
        pixel[0] = va.saturating_sub(vb);
    }

    output
}

pub fn morphological_gradient(src: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel = create_morph_kernel(MorphShape::Ellipse, kernel_size, kernel_size);
    morph(src, MorphType::Gradient, &kernel, 1)
}

pub fn tophat(src: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel = create_morph_kernel(MorphShape::Rectangle, kernel_size, kernel_size);
    morph(src, MorphType::TopHat, &kernel, 1)
}

pub fn blackhat(src: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel = create_morph_kernel(MorphShape::Rectangle, kernel_size, kernel_size);
    morph(src, MorphType::BlackHat, &kernel, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

/// Flood fill from `seed`, recoloring the connected region of the seed's
/// value to `new_value`. Returns the number of filled pixels.
pub fn flood_fill(
    img: &mut GrayImage,
    seed: (u32, u32),
    new_value: u8,
    connectivity: Connectivity,
) -> usize {
    let width = img.width() as i32;
    let height = img.height() as i32;
    let (sx, sy) = (seed.0 as i32, seed.1 as i32);
    if sx >= width || sy >= height {
        return 0;
    }

    let target = img.get_pixel(seed.0, seed.1)[0];
    if target == new_value {
        return 0;
    }

    let dirs: &[(i32, i32)] = match connectivity {
        Connectivity::Four => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
        Connectivity::Eight => &[
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ],
    };

    let mut filled = 0usize;
    let mut stack = vec![(sx, sy)];
    img.put_pixel(seed.0, seed.1, image::Luma([new_value]));

    while let Some((x, y)) = stack.pop() {
        filled += 1;
        for &(dx, dy) in dirs {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            if img.get_pixel(nx as u32, ny as u32)[0] == target {
                img.put_pixel(nx as u32, ny as u32, image::Luma([new_value]));
                stack.push((nx, ny));
            }
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn dot_image() -> GrayImage {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        img
    }

    #[test]
    fn dilate_grows_dot() {
        let kernel = create_morph_kernel(MorphShape::Rectangle, 3, 3);
        let out = dilate(&dot_image(), &kernel, 1);
        assert_eq!(out.get_pixel(3, 3)[0], 255);
        assert_eq!(out.get_pixel(5, 5)[0], 255);
        assert_eq!(out.get_pixel(2, 2)[0], 0);
    }

    #[test]
    fn erode_removes_dot() {
        let kernel = create_morph_kernel(MorphShape::Rectangle, 3, 3);
        let out = erode(&dot_image(), &kernel, 1);
        assert!(out.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn open_removes_speckle_keeps_block() {
        let mut img = GrayImage::new(16, 16);
        img.put_pixel(2, 2, Luma([255]));
        for y in 6..12 {
            for x in 6..12 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let kernel = create_morph_kernel(MorphShape::Rectangle, 3, 3);
        let out = morph(&img, MorphType::Open, &kernel, 1);
        assert_eq!(out.get_pixel(2, 2)[0], 0);
        assert_eq!(out.get_pixel(8, 8)[0], 255);
    }

    #[test]
    fn close_fills_hole() {
        let mut img = GrayImage::new(16, 16);
        for y in 4..12 {
            for x in 4..12 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img.put_pixel(8, 8, Luma([0]));
        let kernel = create_morph_kernel(MorphShape::Rectangle, 3, 3);
        let out = morph(&img, MorphType::Close, &kernel, 1);
        assert_eq!(out.get_pixel(8, 8)[0], 255);
    }

    #[test]
    fn gradient_marks_boundary_only() {
        let mut img = GrayImage::new(16, 16);
        for y in 4..12 {
            for x in 4..12 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let out = morphological_gradient(&img, 3);
        assert_eq!(out.get_pixel(8, 8)[0], 0);
        assert!(out.get_pixel(4, 4)[0] > 0);
    }

    #[test]
    fn flood_fill_counts_region() {
        let mut img = GrayImage::new(8, 8);
        for y in 2..5 {
            for x in 2..5 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let filled = flood_fill(&mut img, (3, 3), 128, Connectivity::Four);
        assert_eq!(filled, 9);
        assert_eq!(img.get_pixel(2, 2)[0], 128);
        assert_eq!(img.get_pixel(6, 6)[0], 0);
    }

    #[test]
    fn flood_fill_respects_connectivity() {
        // Two diagonal pixels touch only at a corner.
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(1, 1, Luma([255]));
        img.put_pixel(2, 2, Luma([255]));

        let mut four = img.clone();
        assert_eq!(flood_fill(&mut four, (1, 1), 99, Connectivity::Four), 1);
        assert_eq!(flood_fill(&mut img, (1, 1), 99, Connectivity::Eight), 2);
    }
}
