use cvkit_core::{CameraIntrinsics, Distortion, Error, Pose};
use nalgebra::{Point2, Point3};

/// Project world points through the pinhole model.
pub fn project_points(
    world: &[Point3<f64>],
    intrinsics: &CameraIntrinsics,
    pose: &Pose,
) -> crate::Result<Vec<Point2<f64>>> {
    let mut out = Vec::with_capacity(world.len());
    for p in world {
        let pc = pose.rotation * p.coords + pose.translation;
        if pc[2].abs() < 1e-12 {
            return Err(Error::InvalidInput(
                "point projects onto the camera plane (z = 0)".into(),
            ));
        }
        let normalized = Point2::new(pc[0] / pc[2], pc[1] / pc[2]);
        out.push(intrinsics.to_pixel(&normalized));
    }
    Ok(out)
}

/// Project with lens distortion applied in normalized coordinates.
pub fn project_points_with_distortion(
    world: &[Point3<f64>],
    intrinsics: &CameraIntrinsics,
    pose: &Pose,
    distortion: &Distortion,
) -> crate::Result<Vec<Point2<f64>>> {
    let mut out = Vec::with_capacity(world.len());
    for p in world {
        let pc = pose.rotation * p.coords + pose.translation;
        if pc[2].abs() < 1e-12 {
            return Err(Error::InvalidInput(
                "point projects onto the camera plane (z = 0)".into(),
            ));
        }
        let (xd, yd) = distortion.apply(pc[0] / pc[2], pc[1] / pc[2]);
        out.push(intrinsics.to_pixel(&Point2::new(xd, yd)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    #[test]
    fn projection_matches_manual_computation() {
        let k = CameraIntrinsics::new(520.0, 515.0, 320.0, 240.0, 640, 480);
        let pose = Pose::new(
            Rotation3::from_euler_angles(0.05, -0.08, 0.03).into_inner(),
            Vector3::new(0.1, -0.03, 0.2),
        );
        let world = vec![
            Point3::new(-0.2, -0.1, 2.0),
            Point3::new(0.3, 0.2, 3.5),
            Point3::new(0.1, -0.25, 4.0),
        ];

        let proj = project_points(&world, &k, &pose).unwrap();
        for (p3, pix) in world.iter().zip(proj.iter()) {
            let pc = pose.rotation * p3.coords + pose.translation;
            let expected = Point2::new(
                k.fx * (pc[0] / pc[2]) + k.cx,
                k.fy * (pc[1] / pc[2]) + k.cy,
            );
            assert!((expected - pix).norm() < 1e-10);
        }
    }

    #[test]
    fn distorted_projection_matches_model() {
        let k = CameraIntrinsics::new(520.0, 515.0, 320.0, 240.0, 640, 480);
        let d = Distortion::new(0.1, -0.04, 0.001, -0.0008, 0.01);
        let pose = Pose::new(
            Rotation3::from_euler_angles(0.05, -0.08, 0.03).into_inner(),
            Vector3::new(0.1, -0.03, 0.2),
        );
        let world = vec![Point3::new(-0.2, -0.1, 2.0), Point3::new(0.3, 0.2, 3.5)];

        let proj = project_points_with_distortion(&world, &k, &pose, &d).unwrap();
        for (p3, pix) in world.iter().zip(proj.iter()) {
            let pc = pose.rotation * p3.coords + pose.translation;
            let (xd, yd) = d.apply(pc[0] / pc[2], pc[1] / pc[2]);
            let expected = Point2::new(k.fx * xd + k.cx, k.fy * yd + k.cy);
            assert!((expected - pix).norm() < 1e-10);
        }
    }

    #[test]
    fn point_on_camera_plane_is_an_error() {
        let k = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0, 640, 480);
        let world = vec![Point3::new(0.1, 0.1, 0.0)];
        assert!(project_points(&world, &k, &Pose::default()).is_err());
    }
}
