use crate::build_index;
use cvkit_core::{Error, PointCloud};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use rstar::PointDistance;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RegistrationResult {
    pub transformation: Matrix4<f32>,
    /// Fraction of source points with a correspondence within range.
    pub fitness: f32,
    pub inlier_rmse: f32,
    pub iterations: usize,
}

/// Best-fit rigid transform mapping `src` onto `dst` (Arun's SVD method).
fn solve_rigid(src: &[Point3<f32>], dst: &[Point3<f32>]) -> Option<Matrix4<f32>> {
    let n = src.len();
    if n < 3 || n != dst.len() {
        return None;
    }

    let mut c_src = Vector3::zeros();
    let mut c_dst = Vector3::zeros();
    for (s, d) in src.iter().zip(dst) {
        c_src += s.coords;
        c_dst += d.coords;
    }
    c_src /= n as f32;
    c_dst /= n as f32;

    let mut h = Matrix3::zeros();
    for (s, d) in src.iter().zip(dst) {
        h += (s.coords - c_src) * (d.coords - c_dst).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        let mut v = v_t.transpose();
        v.column_mut(2).neg_mut();
        r = v * u.transpose();
    }
    let t = c_dst - r * c_src;

    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
    Some(m)
}

/// Point-to-point iterative closest point.
///
/// Each round transforms the source with the current estimate, pairs every
/// transformed point with its nearest target neighbor within
/// `max_correspondence_distance`, and re-solves the rigid transform on the
/// paired sets. Stops when the inlier RMSE change drops below 1e-6 or
/// `max_iterations` is reached.
pub fn registration_icp(
    source: &PointCloud,
    target: &PointCloud,
    max_correspondence_distance: f32,
    init_transformation: Matrix4<f32>,
    max_iterations: usize,
) -> cvkit_core::Result<RegistrationResult> {
    if source.is_empty() || target.is_empty() {
        return Err(Error::InvalidInput("empty point cloud".into()));
    }
    if max_correspondence_distance <= 0.0 {
        return Err(Error::InvalidInput(
            "max_correspondence_distance must be positive".into(),
        ));
    }

    let tree = build_index(target);
    let max_dist2 = max_correspondence_distance * max_correspondence_distance;

    let mut transformation = init_transformation;
    let mut fitness = 0.0f32;
    let mut rmse = f32::INFINITY;
    let mut iterations = 0usize;

    for iter in 0..max_iterations {
        iterations = iter + 1;
        let transformed = source.transform(&transformation);

        let mut pairs_src = Vec::new();
        let mut pairs_dst = Vec::new();
        let mut sq_sum = 0.0f32;

        for (orig, moved) in source.points.iter().zip(&transformed.points) {
            let query = [moved.x, moved.y, moved.z];
            if let Some(nn) = tree.nearest_neighbor(&query) {
                let d2 = nn.distance_2(&query);
                if d2 <= max_dist2 {
                    pairs_src.push(*orig);
                    pairs_dst.push(target.points[nn.index]);
                    sq_sum += d2;
                }
            }
        }

        if pairs_src.len() < 3 {
            return Err(Error::NotConverged(format!(
                "only {} correspondences within range",
                pairs_src.len()
            )));
        }

        fitness = pairs_src.len() as f32 / source.len() as f32;
        let new_rmse = (sq_sum / pairs_src.len() as f32).sqrt();
        debug!(iter, fitness, rmse = new_rmse, "ICP iteration");

        let Some(update) = solve_rigid(&pairs_src, &pairs_dst) else {
            return Err(Error::AlgorithmError(
                "degenerate correspondence set".into(),
            ));
        };
        transformation = update;

        if (rmse - new_rmse).abs() < 1e-6 {
            rmse = new_rmse;
            break;
        }
        rmse = new_rmse;
    }

    Ok(RegistrationResult {
        transformation,
        fitness,
        inlier_rmse: rmse,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    fn sample_cloud() -> PointCloud {
        let mut points = Vec::new();
        // An asymmetric L-shaped slab so the registration is unambiguous.
        for z in 0..3 {
            for y in 0..10 {
                for x in 0..10 {
                    if x < 4 || y < 4 {
                        points.push(Point3::new(
                            x as f32 * 0.1,
                            y as f32 * 0.1,
                            z as f32 * 0.1,
                        ));
                    }
                }
            }
        }
        PointCloud::new(points)
    }

    fn rigid(rx: f32, ry: f32, rz: f32, t: Vector3<f32>) -> Matrix4<f32> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(Rotation3::from_euler_angles(rx, ry, rz).matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
        m
    }

    #[test]
    fn solve_rigid_recovers_exact_transform() {
        let src = sample_cloud();
        let gt = rigid(0.2, -0.1, 0.3, Vector3::new(0.5, -0.2, 0.8));
        let dst = src.transform(&gt);
        let est = solve_rigid(&src.points, &dst.points).unwrap();
        assert!((est - gt).norm() < 1e-4);
    }

    #[test]
    fn icp_aligns_small_displacement() {
        let target = sample_cloud();
        let gt = rigid(0.05, 0.03, -0.04, Vector3::new(0.04, -0.03, 0.05));
        // Source is the target moved by the inverse: ICP should find gt.
        let source = target.transform(&gt.try_inverse().unwrap());

        let res = registration_icp(&source, &target, 0.3, Matrix4::identity(), 50).unwrap();
        assert!(res.fitness > 0.95);
        assert!(res.inlier_rmse < 1e-3);
        assert!((res.transformation - gt).norm() < 1e-2);
    }

    #[test]
    fn icp_with_good_init_converges_fast() {
        let target = sample_cloud();
        let gt = rigid(0.3, -0.25, 0.2, Vector3::new(0.4, 0.3, -0.2));
        let source = target.transform(&gt.try_inverse().unwrap());

        let res = registration_icp(&source, &target, 0.5, gt, 30).unwrap();
        assert!(res.inlier_rmse < 1e-4);
        assert!(res.iterations <= 5);
    }

    #[test]
    fn icp_rejects_empty_inputs() {
        let pc = sample_cloud();
        let empty = PointCloud::default();
        assert!(registration_icp(&empty, &pc, 0.1, Matrix4::identity(), 10).is_err());
        assert!(registration_icp(&pc, &empty, 0.1, Matrix4::identity(), 10).is_err());
    }
}
