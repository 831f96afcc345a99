use cvkit_core::{CameraIntrinsics, Distortion, Error};
use cvkit_imgproc::{remap, BorderMode, Interpolation};
use image::GrayImage;
use nalgebra::{Matrix3, Point2, Vector3};

/// Undo lens distortion on pixel coordinates by fixed-point iteration of
/// the forward model in normalized space.
pub fn undistort_points(
    points: &[Point2<f64>],
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> crate::Result<Vec<Point2<f64>>> {
    const ITERATIONS: usize = 20;

    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let d = intrinsics.to_normalized(p);
        let (xd, yd) = (d.x, d.y);
        let mut x = xd;
        let mut y = yd;

        for _ in 0..ITERATIONS {
            let r2 = x * x + y * y;
            let radial =
                1.0 + distortion.k1 * r2 + distortion.k2 * r2 * r2 + distortion.k3 * r2 * r2 * r2;
            if radial.abs() < 1e-12 {
                return Err(Error::AlgorithmError(
                    "degenerate radial factor while undistorting".into(),
                ));
            }
            let dx = 2.0 * distortion.p1 * x * y + distortion.p2 * (r2 + 2.0 * x * x);
            let dy = distortion.p1 * (r2 + 2.0 * y * y) + 2.0 * distortion.p2 * x * y;
            x = (xd - dx) / radial;
            y = (yd - dy) / radial;
        }

        out.push(intrinsics.to_pixel(&Point2::new(x, y)));
    }
    Ok(out)
}

/// Build per-pixel source maps for undistortion plus an optional
/// rectifying rotation, in the destination camera `new_intrinsics`.
pub fn init_undistort_rectify_map(
    size: (u32, u32),
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
    rectify: &Matrix3<f64>,
    new_intrinsics: &CameraIntrinsics,
) -> crate::Result<(Vec<f32>, Vec<f32>)> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput("empty map size".into()));
    }
    let r_inv = rectify
        .try_inverse()
        .ok_or_else(|| Error::InvalidInput("rectification matrix is singular".into()))?;

    let count = (width * height) as usize;
    let mut map_x = vec![0.0f32; count];
    let mut map_y = vec![0.0f32; count];

    for y in 0..height {
        for x in 0..width {
            let n = new_intrinsics.to_normalized(&Point2::new(x as f64, y as f64));
            let ray = r_inv * Vector3::new(n.x, n.y, 1.0);
            if ray[2].abs() < 1e-12 {
                return Err(Error::AlgorithmError(
                    "rectified ray parallel to image plane".into(),
                ));
            }
            let (xd, yd) = distortion.apply(ray[0] / ray[2], ray[1] / ray[2]);
            let src = intrinsics.to_pixel(&Point2::new(xd, yd));
            let idx = (y * width + x) as usize;
            map_x[idx] = src.x as f32;
            map_y[idx] = src.y as f32;
        }
    }

    Ok((map_x, map_y))
}

/// Undistort an image. `new_intrinsics` defaults to the source intrinsics.
pub fn undistort_image(
    src: &GrayImage,
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
    new_intrinsics: Option<&CameraIntrinsics>,
) -> crate::Result<GrayImage> {
    let new_k = new_intrinsics.unwrap_or(intrinsics);
    let (map_x, map_y) = init_undistort_rectify_map(
        src.dimensions(),
        intrinsics,
        distortion,
        &Matrix3::identity(),
        new_k,
    )?;
    Ok(remap(
        src,
        &map_x,
        &map_y,
        src.width(),
        src.height(),
        Interpolation::Linear,
        BorderMode::Constant(0),
    ))
}
