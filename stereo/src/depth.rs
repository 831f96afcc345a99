use crate::DisparityMap;
use cvkit_core::{CameraIntrinsics, PointCloud};
use nalgebra::Point3;

/// Depth map in the baseline's units: Z = f * B / d.
/// Invalid (zero or negative) disparities produce depth 0.
pub fn disparity_to_depth(disp: &DisparityMap, focal_px: f32, baseline: f32) -> Vec<f32> {
    disp.data
        .iter()
        .map(|&d| {
            if d > 0.0 {
                focal_px * baseline / d
            } else {
                0.0
            }
        })
        .collect()
}

/// Reproject a disparity map to a 3D point cloud through the pinhole model
/// of the left camera. Pixels with invalid disparity are skipped.
pub fn reproject_to_cloud(
    disp: &DisparityMap,
    intrinsics: &CameraIntrinsics,
    baseline: f32,
) -> PointCloud {
    let mut points = Vec::new();
    for y in 0..disp.height {
        for x in 0..disp.width {
            let d = disp.get(x, y);
            if d <= 0.0 {
                continue;
            }
            let z = intrinsics.fx as f32 * baseline / d;
            let px = (x as f32 - intrinsics.cx as f32) * z / intrinsics.fx as f32;
            let py = (y as f32 - intrinsics.cy as f32) * z / intrinsics.fy as f32;
            points.push(Point3::new(px, py, z));
        }
    }
    PointCloud::new(points)
}
