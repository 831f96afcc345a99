use crate::build_index;
use cvkit_core::PointCloud;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Estimate per-point normals by PCA over the `k` nearest neighbors: the
/// normal is the eigenvector of the neighborhood covariance with the
/// smallest eigenvalue.
pub fn estimate_normals(pc: &mut PointCloud, k: usize) {
    let n = pc.len();
    if n == 0 || k < 3 {
        return;
    }

    let tree = build_index(pc);
    let points = &pc.points;

    let normals: Vec<Vector3<f32>> = points
        .par_iter()
        .map(|p| {
            let query = [p.x, p.y, p.z];
            let neighbors: Vec<usize> = tree
                .nearest_neighbor_iter(&query)
                .take(k + 1)
                .map(|e| e.index)
                .collect();

            if neighbors.len() < 3 {
                return Vector3::z();
            }

            let mut centroid = Vector3::zeros();
            for &i in &neighbors {
                centroid += points[i].coords;
            }
            centroid /= neighbors.len() as f32;

            let mut cov = Matrix3::zeros();
            for &i in &neighbors {
                let d = points[i].coords - centroid;
                cov += d * d.transpose();
            }

            let eigen = cov.symmetric_eigen();
            let mut min_idx = 0;
            for i in 1..3 {
                if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
                    min_idx = i;
                }
            }
            let mut normal: Vector3<f32> = eigen.eigenvectors.column(min_idx).into_owned();
            if normal.norm_squared() > 1e-12 {
                normal.normalize_mut();
            }
            normal
        })
        .collect();

    pc.normals = Some(normals);
}

/// Flip normals to point toward the viewpoint (defaults to the origin).
pub fn orient_normals_towards_viewpoint(pc: &mut PointCloud, viewpoint: Vector3<f32>) {
    let Some(normals) = &mut pc.normals else {
        return;
    };
    for (p, normal) in pc.points.iter().zip(normals.iter_mut()) {
        let to_view = viewpoint - p.coords;
        if normal.dot(&to_view) < 0.0 {
            *normal = -*normal;
        }
    }
}
