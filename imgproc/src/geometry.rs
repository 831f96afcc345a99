use crate::{BorderMode, Interpolation};
use image::GrayImage;
use nalgebra::{Matrix3, Point2};
use rayon::prelude::*;

pub fn get_pixel_bilinear(img: &GrayImage, x: f32, y: f32) -> f32 {
    get_pixel_bilinear_with_border(img, x, y, BorderMode::Constant(0))
}

fn get_pixel_bilinear_with_border(img: &GrayImage, x: f32, y: f32, border: BorderMode) -> f32 {
    let x0 = x.floor() as isize;
    let y0 = y.floor() as isize;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let v00 = sample_pixel(img, x0, y0, border);
    let v10 = sample_pixel(img, x1, y0, border);
    let v01 = sample_pixel(img, x0, y1, border);
    let v11 = sample_pixel(img, x1, y1, border);

    let v0 = v00 * (1.0 - fx) + v10 * fx;
    let v1 = v01 * (1.0 - fx) + v11 * fx;

    v0 * (1.0 - fy) + v1 * fy
}

fn get_pixel_nearest_with_border(img: &GrayImage, x: f32, y: f32, border: BorderMode) -> f32 {
    let xi = x.round() as isize;
    let yi = y.round() as isize;
    sample_pixel(img, xi, yi, border)
}

fn sample_pixel(img: &GrayImage, x: isize, y: isize, border: BorderMode) -> f32 {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let raw = img.as_raw();

    match (
        crate::convolve::map_coord(x, width, border),
        crate::convolve::map_coord(y, height, border),
    ) {
        (Some(ix), Some(iy)) => raw[iy * width + ix] as f32,
        _ => match border {
            BorderMode::Constant(v) => v as f32,
            _ => 0.0,
        },
    }
}

fn interpolate_sample(
    src: &GrayImage,
    x: f32,
    y: f32,
    interpolation: Interpolation,
    border: BorderMode,
) -> f32 {
    match interpolation {
        Interpolation::Nearest => get_pixel_nearest_with_border(src, x, y, border),
        Interpolation::Linear => get_pixel_bilinear_with_border(src, x, y, border),
    }
}

/// Warp with a full projective matrix, inverse-mapping destination pixels
/// back into the source.
pub fn warp_perspective_ex(
    src: &GrayImage,
    matrix: &Matrix3<f32>,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> GrayImage {
    let mut dst = GrayImage::new(width, height);

    dst.as_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let pt = Point2::new(x as f32, y as f32);
                let src_pt = transform_point(matrix, &pt);
                let val = interpolate_sample(src, src_pt.x, src_pt.y, interpolation, border);
                row[x as usize] = val.clamp(0.0, 255.0) as u8;
            }
        });

    dst
}

pub fn warp_perspective(
    src: &GrayImage,
    matrix: &Matrix3<f32>,
    width: u32,
    height: u32,
) -> GrayImage {
    warp_perspective_ex(
        src,
        matrix,
        width,
        height,
        Interpolation::Linear,
        BorderMode::Constant(0),
    )
}

pub fn warp_affine(
    src: &GrayImage,
    matrix_2x3: [[f32; 3]; 2],
    width: u32,
    height: u32,
) -> GrayImage {
    warp_affine_ex(
        src,
        matrix_2x3,
        width,
        height,
        Interpolation::Linear,
        BorderMode::Constant(0),
    )
}

pub fn warp_affine_ex(
    src: &GrayImage,
    matrix_2x3: [[f32; 3]; 2],
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> GrayImage {
    let matrix = Matrix3::new(
        matrix_2x3[0][0],
        matrix_2x3[0][1],
        matrix_2x3[0][2],
        matrix_2x3[1][0],
        matrix_2x3[1][1],
        matrix_2x3[1][2],
        0.0,
        0.0,
        1.0,
    );

    // Warp uses inverse mapping from destination -> source coordinates.
    let inv = matrix.try_inverse().unwrap_or(matrix);
    warp_perspective_ex(src, &inv, width, height, interpolation, border)
}

pub fn remap(
    src: &GrayImage,
    map_x: &[f32],
    map_y: &[f32],
    width: u32,
    height: u32,
    interpolation: Interpolation,
    border: BorderMode,
) -> GrayImage {
    assert_eq!(
        map_x.len(),
        (width * height) as usize,
        "map_x size must equal width*height"
    );
    assert_eq!(
        map_y.len(),
        (width * height) as usize,
        "map_y size must equal width*height"
    );

    let mut dst = GrayImage::new(width, height);

    dst.as_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for x in 0..width {
                let idx = (y * width + x) as usize;
                let sx = map_x[idx];
                let sy = map_y[idx];
                let val = interpolate_sample(src, sx, sy, interpolation, border);
                row[x as usize] = val.clamp(0.0, 255.0) as u8;
            }
        });

    dst
}

fn transform_point(matrix: &Matrix3<f32>, pt: &Point2<f32>) -> Point2<f32> {
    let x = pt.x;
    let y = pt.y;

    let w = matrix[(2, 0)] * x + matrix[(2, 1)] * y + matrix[(2, 2)];

    if w.abs() > 1e-10 {
        Point2::new(
            (matrix[(0, 0)] * x + matrix[(0, 1)] * y + matrix[(0, 2)]) / w,
            (matrix[(1, 0)] * x + matrix[(1, 1)] * y + matrix[(1, 2)]) / w,
        )
    } else {
        Point2::new(
            matrix[(0, 0)] * x + matrix[(0, 1)] * y + matrix[(0, 2)],
            matrix[(1, 0)] * x + matrix[(1, 1)] * y + matrix[(1, 2)],
        )
    }
}

/// Rotation about `center` by `angle` radians with uniform `scale`,
/// as a full 3x3 matrix with the translation folded in.
pub fn get_rotation_matrix(center: Point2<f32>, angle: f32, scale: f32) -> Matrix3<f32> {
    let cos_a = angle.cos();
    let sin_a = angle.sin();

    let tx = center.x * (1.0 - scale * cos_a) + center.y * scale * sin_a;
    let ty = center.y * (1.0 - scale * cos_a) - center.x * scale * sin_a;

    Matrix3::new(
        scale * cos_a,
        scale * sin_a,
        tx,
        -scale * sin_a,
        scale * cos_a,
        ty,
        0.0,
        0.0,
        1.0,
    )
}

pub fn get_translation_matrix(dx: f32, dy: f32) -> Matrix3<f32> {
    Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0)
}

pub fn get_scaling_matrix(sx: f32, sy: f32) -> Matrix3<f32> {
    Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn warp_affine_translation_moves_point() {
        let mut img = GrayImage::new(8, 8);
        img.put_pixel(2, 2, Luma([255]));

        // dst(x,y) = src(x-2, y-1)
        let m = [[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]];
        let out = warp_affine_ex(
            &img,
            m,
            8,
            8,
            Interpolation::Nearest,
            BorderMode::Constant(0),
        );
        assert_eq!(out.get_pixel(4, 3)[0], 255);
    }

    #[test]
    fn warp_perspective_identity_preserves_point() {
        let mut img = GrayImage::new(7, 7);
        img.put_pixel(5, 4, Luma([180]));
        let i = Matrix3::identity();
        let out = warp_perspective(&img, &i, 7, 7);
        assert_eq!(out.get_pixel(5, 4)[0], 180);
    }

    #[test]
    fn remap_identity_keeps_pixels() {
        let mut img = GrayImage::new(6, 4);
        img.put_pixel(2, 1, Luma([200]));
        img.put_pixel(4, 3, Luma([123]));

        let mut map_x = vec![0.0f32; 24];
        let mut map_y = vec![0.0f32; 24];
        for y in 0..4u32 {
            for x in 0..6u32 {
                map_x[(y * 6 + x) as usize] = x as f32;
                map_y[(y * 6 + x) as usize] = y as f32;
            }
        }
        let out = remap(
            &img,
            &map_x,
            &map_y,
            6,
            4,
            Interpolation::Nearest,
            BorderMode::Replicate,
        );
        assert_eq!(out.get_pixel(2, 1)[0], 200);
        assert_eq!(out.get_pixel(4, 3)[0], 123);
    }

    #[test]
    fn full_turn_rotation_is_identity() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(6, 3, Luma([210]));
        let m = get_rotation_matrix(
            Point2::new(4.0, 4.0),
            2.0 * std::f32::consts::PI,
            1.0,
        );
        let inv = m.try_inverse().unwrap();
        let out = warp_perspective_ex(
            &img,
            &inv,
            9,
            9,
            Interpolation::Nearest,
            BorderMode::Constant(0),
        );
        assert_eq!(out.get_pixel(6, 3)[0], 210);
    }
}
