//! Planar camera calibration (Zhang's method).

use crate::homography::find_homography;
use crate::project::project_points;
use cvkit_core::{CameraIntrinsics, Error, Pose};
use nalgebra::{DMatrix, Matrix3, Point2, Point3, Vector3, Vector6};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CameraCalibrationResult {
    pub intrinsics: CameraIntrinsics,
    pub extrinsics: Vec<Pose>,
    pub rms_reprojection_error: f64,
}

/// Object points of a chessboard's inner corners on the Z=0 plane,
/// row-major from the origin corner.
pub fn generate_chessboard_object_points(
    pattern: (usize, usize),
    square_size: f64,
) -> Vec<Point3<f64>> {
    let (cols, rows) = pattern;
    let mut pts = Vec::with_capacity(cols * rows);
    for y in 0..rows {
        for x in 0..cols {
            pts.push(Point3::new(
                x as f64 * square_size,
                y as f64 * square_size,
                0.0,
            ));
        }
    }
    pts
}

/// The v_ij constraint row on B = K^-T K^-1 from homography columns i, j.
fn v_row(h: &Matrix3<f64>, i: usize, j: usize) -> Vector6<f64> {
    Vector6::new(
        h[(0, i)] * h[(0, j)],
        h[(0, i)] * h[(1, j)] + h[(1, i)] * h[(0, j)],
        h[(1, i)] * h[(1, j)],
        h[(2, i)] * h[(0, j)] + h[(0, i)] * h[(2, j)],
        h[(2, i)] * h[(1, j)] + h[(1, i)] * h[(2, j)],
        h[(2, i)] * h[(2, j)],
    )
}

fn intrinsics_from_homographies(
    homographies: &[Matrix3<f64>],
    image_size: (u32, u32),
) -> crate::Result<CameraIntrinsics> {
    let n = homographies.len();
    let mut v = DMatrix::<f64>::zeros(2 * n, 6);
    for (idx, h) in homographies.iter().enumerate() {
        let v12 = v_row(h, 0, 1);
        let v11 = v_row(h, 0, 0);
        let v22 = v_row(h, 1, 1);
        for c in 0..6 {
            v[(2 * idx, c)] = v12[c];
            v[(2 * idx + 1, c)] = v11[c] - v22[c];
        }
    }

    let svd = v.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| Error::AlgorithmError("SVD failed on calibration system".into()))?;
    let b_vec = v_t.row(v_t.nrows() - 1);
    let mut b = [b_vec[0], b_vec[1], b_vec[2], b_vec[3], b_vec[4], b_vec[5]];
    if b[0] < 0.0 {
        for v in &mut b {
            *v = -*v;
        }
    }
    let (b11, b12, b22, b13, b23, b33) = (b[0], b[1], b[2], b[3], b[4], b[5]);

    let denom = b11 * b22 - b12 * b12;
    if denom.abs() < 1e-18 || b11.abs() < 1e-18 {
        return Err(Error::AlgorithmError(
            "degenerate view set (need tilted views of the plane)".into(),
        ));
    }

    let v0 = (b12 * b13 - b11 * b23) / denom;
    let lambda = b33 - (b13 * b13 + v0 * (b12 * b13 - b11 * b23)) / b11;
    if lambda / b11 <= 0.0 || lambda * b11 / denom <= 0.0 {
        return Err(Error::NotConverged(
            "calibration produced a non-positive-definite B matrix".into(),
        ));
    }
    let alpha = (lambda / b11).sqrt();
    let beta = (lambda * b11 / denom).sqrt();
    let gamma = -b12 * alpha * alpha * beta / lambda;
    let u0 = gamma * v0 / beta - b13 * alpha * alpha / lambda;

    debug!(fx = alpha, fy = beta, cx = u0, cy = v0, skew = gamma, "intrinsics from B matrix");

    Ok(CameraIntrinsics::new(
        alpha,
        beta,
        u0,
        v0,
        image_size.0,
        image_size.1,
    ))
}

fn extrinsics_from_homography(
    h: &Matrix3<f64>,
    intrinsics: &CameraIntrinsics,
) -> crate::Result<Pose> {
    let k_inv = intrinsics
        .matrix()
        .try_inverse()
        .ok_or_else(|| Error::AlgorithmError("intrinsic matrix is singular".into()))?;

    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let kh1: Vector3<f64> = k_inv * h1;
    let norm = kh1.norm();
    if norm < 1e-12 {
        return Err(Error::AlgorithmError("homography collapses first axis".into()));
    }
    let lam = 1.0 / norm;

    let mut r1 = kh1 * lam;
    let mut r2 = (k_inv * h2) * lam;
    let mut t = (k_inv * h3) * lam;

    // The plane must sit in front of the camera.
    if t[2] < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    let r3 = r1.cross(&r2);

    // Re-orthogonalize: nearest rotation in Frobenius norm.
    let q = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = q.svd(true, true);
    let (u, v_t) = (
        svd.u
            .ok_or_else(|| Error::AlgorithmError("SVD failed on rotation".into()))?,
        svd.v_t
            .ok_or_else(|| Error::AlgorithmError("SVD failed on rotation".into()))?,
    );
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u = u;
        u.column_mut(2).neg_mut();
        r = u * v_t;
    }

    Ok(Pose::new(r, t))
}

/// Calibrate from >= 3 views of a planar target. `object_sets[i]` are the
/// Z=0 target points seen in view i, `image_sets[i]` their pixel positions.
pub fn calibrate_camera_planar(
    object_sets: &[Vec<Point3<f64>>],
    image_sets: &[Vec<Point2<f64>>],
    image_size: (u32, u32),
) -> crate::Result<CameraCalibrationResult> {
    if object_sets.len() != image_sets.len() {
        return Err(Error::DimensionMismatch(format!(
            "{} object sets vs {} image sets",
            object_sets.len(),
            image_sets.len()
        )));
    }
    if object_sets.len() < 3 {
        return Err(Error::InvalidInput(
            "planar calibration needs at least 3 views".into(),
        ));
    }

    let mut homographies = Vec::with_capacity(object_sets.len());
    for (view, (obj, img)) in object_sets.iter().zip(image_sets.iter()).enumerate() {
        if obj.len() != img.len() || obj.len() < 4 {
            return Err(Error::InvalidInput(format!(
                "view {view}: need >= 4 matched points, got {} and {}",
                obj.len(),
                img.len()
            )));
        }
        let plane: Vec<Point2<f64>> = obj.iter().map(|p| Point2::new(p.x, p.y)).collect();
        let h = find_homography(&plane, img)?;
        debug!(view, "homography estimated");
        homographies.push(h);
    }

    let intrinsics = intrinsics_from_homographies(&homographies, image_size)?;

    let mut extrinsics = Vec::with_capacity(homographies.len());
    for h in &homographies {
        extrinsics.push(extrinsics_from_homography(h, &intrinsics)?);
    }

    // RMS reprojection error over all views.
    let mut sq_sum = 0.0f64;
    let mut count = 0usize;
    for ((obj, img), pose) in object_sets.iter().zip(image_sets.iter()).zip(&extrinsics) {
        let projected = project_points(obj, &intrinsics, pose)?;
        for (p, q) in projected.iter().zip(img.iter()) {
            sq_sum += (p - q).norm_squared();
            count += 1;
        }
    }
    let rms = (sq_sum / count as f64).sqrt();
    debug!(rms, "planar calibration finished");

    Ok(CameraCalibrationResult {
        intrinsics,
        extrinsics,
        rms_reprojection_error: rms,
    })
}
