use cvkit_core::{Error, Ransac, RobustConfig, RobustModel};
use nalgebra::{DMatrix, Matrix3, Point2, Vector3};

/// Map a point through a homography.
pub fn apply_homography(h: &Matrix3<f64>, p: &Point2<f64>) -> Point2<f64> {
    let v = h * Vector3::new(p.x, p.y, 1.0);
    if v[2].abs() > 1e-12 {
        Point2::new(v[0] / v[2], v[1] / v[2])
    } else {
        Point2::new(v[0], v[1])
    }
}

/// Hartley normalization: translate to the centroid and scale so the
/// average distance from the origin is sqrt(2).
fn normalization_transform(points: &[&Point2<f64>]) -> Matrix3<f64> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let scale = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(scale, 0.0, -scale * cx, 0.0, scale, -scale * cy, 0.0, 0.0, 1.0)
}

fn dlt_homography(src: &[&Point2<f64>], dst: &[&Point2<f64>]) -> Option<Matrix3<f64>> {
    let n = src.len();
    if n < 4 || n != dst.len() {
        return None;
    }

    let t_src = normalization_transform(src);
    let t_dst = normalization_transform(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let sn = apply_homography(&t_src, s);
        let dn = apply_homography(&t_dst, d);
        let (x, y) = (sn.x, sn.y);
        let (u, v) = (dn.x, dn.y);

        a[(2 * i, 0)] = -x;
        a[(2 * i, 1)] = -y;
        a[(2 * i, 2)] = -1.0;
        a[(2 * i, 6)] = u * x;
        a[(2 * i, 7)] = u * y;
        a[(2 * i, 8)] = u;

        a[(2 * i + 1, 3)] = -x;
        a[(2 * i + 1, 4)] = -y;
        a[(2 * i + 1, 5)] = -1.0;
        a[(2 * i + 1, 6)] = v * x;
        a[(2 * i + 1, 7)] = v * y;
        a[(2 * i + 1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let h_vec = v_t.row(v_t.nrows() - 1);

    let h_norm = Matrix3::new(
        h_vec[0], h_vec[1], h_vec[2], h_vec[3], h_vec[4], h_vec[5], h_vec[6], h_vec[7], h_vec[8],
    );

    let t_dst_inv = t_dst.try_inverse()?;
    let mut h = t_dst_inv * h_norm * t_src;

    if h[(2, 2)].abs() < 1e-12 {
        return None;
    }
    h /= h[(2, 2)];
    Some(h)
}

/// Estimate a homography from >= 4 correspondences with the normalized DLT.
pub fn find_homography(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
) -> crate::Result<Matrix3<f64>> {
    if src.len() < 4 || src.len() != dst.len() {
        return Err(Error::InvalidInput(format!(
            "need >= 4 matched points, got {} and {}",
            src.len(),
            dst.len()
        )));
    }
    let src_refs: Vec<&Point2<f64>> = src.iter().collect();
    let dst_refs: Vec<&Point2<f64>> = dst.iter().collect();
    dlt_homography(&src_refs, &dst_refs)
        .ok_or_else(|| Error::AlgorithmError("degenerate point configuration".into()))
}

struct HomographyEstimator;

impl RobustModel<(Point2<f64>, Point2<f64>)> for HomographyEstimator {
    type Model = Matrix3<f64>;

    fn min_sample_size(&self) -> usize {
        4
    }

    fn estimate(&self, data: &[&(Point2<f64>, Point2<f64>)]) -> Option<Matrix3<f64>> {
        let src: Vec<&Point2<f64>> = data.iter().map(|d| &d.0).collect();
        let dst: Vec<&Point2<f64>> = data.iter().map(|d| &d.1).collect();
        dlt_homography(&src, &dst)
    }

    /// Symmetric transfer error.
    fn compute_error(&self, model: &Matrix3<f64>, data: &(Point2<f64>, Point2<f64>)) -> f64 {
        let forward = (apply_homography(model, &data.0) - data.1).norm();
        match model.try_inverse() {
            Some(inv) => forward + (apply_homography(&inv, &data.1) - data.0).norm(),
            None => f64::INFINITY,
        }
    }
}

/// RANSAC homography estimation. Returns the model refit on all inliers
/// plus the inlier mask.
pub fn find_homography_ransac(
    src: &[Point2<f64>],
    dst: &[Point2<f64>],
    threshold: f64,
    max_iterations: usize,
) -> crate::Result<(Matrix3<f64>, Vec<bool>)> {
    if src.len() < 4 || src.len() != dst.len() {
        return Err(Error::InvalidInput(format!(
            "need >= 4 matched points, got {} and {}",
            src.len(),
            dst.len()
        )));
    }

    let data: Vec<(Point2<f64>, Point2<f64>)> =
        src.iter().cloned().zip(dst.iter().cloned()).collect();
    let ransac = Ransac::new(RobustConfig {
        threshold,
        max_iterations,
        confidence: 0.99,
        min_sample_size: 4,
    });
    let res = ransac.run(&HomographyEstimator, &data);

    let Some(_) = res.model else {
        return Err(Error::AlgorithmError(
            "no homography model found".into(),
        ));
    };

    // Refit on the inlier set for the final model.
    let in_src: Vec<Point2<f64>> = src
        .iter()
        .zip(res.inliers.iter())
        .filter_map(|(p, &m)| m.then_some(*p))
        .collect();
    let in_dst: Vec<Point2<f64>> = dst
        .iter()
        .zip(res.inliers.iter())
        .filter_map(|(p, &m)| m.then_some(*p))
        .collect();

    let refined = find_homography(&in_src, &in_dst)?;
    Ok((refined, res.inliers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<Point2<f64>> {
        let mut pts = Vec::new();
        for y in 0..6 {
            for x in 0..8 {
                pts.push(Point2::new(40.0 + x as f64 * 30.0, 30.0 + y as f64 * 28.0));
            }
        }
        pts
    }

    #[test]
    fn recovers_known_projective_transform() {
        let h_gt = Matrix3::new(0.95, -0.05, 12.0, 0.04, 1.05, -8.0, 0.0003, -0.0002, 1.0);
        let src = grid_points();
        let dst: Vec<Point2<f64>> = src.iter().map(|p| apply_homography(&h_gt, p)).collect();

        let h = find_homography(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert!((apply_homography(&h, s) - d).norm() < 1e-8);
        }
    }

    #[test]
    fn ransac_survives_outliers() {
        let h_gt = Matrix3::new(1.02, 0.03, -6.0, -0.02, 0.98, 9.0, 0.0001, 0.0002, 1.0);
        let src = grid_points();
        let mut dst: Vec<Point2<f64>> = src.iter().map(|p| apply_homography(&h_gt, p)).collect();
        for i in (0..dst.len()).step_by(6) {
            dst[i].x += 60.0;
            dst[i].y -= 45.0;
        }

        let (h, inliers) = find_homography_ransac(&src, &dst, 1.0, 500).unwrap();
        let inlier_count = inliers.iter().filter(|&&m| m).count();
        assert!(inlier_count >= 40);

        let mean_err: f64 = src
            .iter()
            .zip(dst.iter())
            .zip(inliers.iter())
            .filter(|(_, &m)| m)
            .map(|((s, d), _)| (apply_homography(&h, s) - d).norm())
            .sum::<f64>()
            / inlier_count as f64;
        assert!(mean_err < 0.5);
    }

    #[test]
    fn too_few_points_rejected() {
        let pts = vec![Point2::new(0.0, 0.0); 3];
        assert!(find_homography(&pts, &pts).is_err());
    }

    #[test]
    fn identity_recovered_from_identical_sets() {
        let src = grid_points();
        let h = find_homography(&src, &src).unwrap();
        for s in &src {
            assert!((apply_homography(&h, s) - s).norm() < 1e-8);
        }
    }
}
