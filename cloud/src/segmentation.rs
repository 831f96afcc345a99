use crate::build_index;
use cvkit_core::{PointCloud, Ransac, RobustConfig, RobustModel};
use nalgebra::Point3;

/// Plane model ax + by + cz + d = 0 with unit normal, estimated from
/// 3-point samples.
struct PlaneEstimator;

impl RobustModel<Point3<f32>> for PlaneEstimator {
    type Model = [f32; 4];

    fn min_sample_size(&self) -> usize {
        3
    }

    fn estimate(&self, data: &[&Point3<f32>]) -> Option<[f32; 4]> {
        let p0 = data[0];
        let p1 = data[1];
        let p2 = data[2];
        let v1 = p1 - p0;
        let v2 = p2 - p0;
        let normal = v1.cross(&v2);
        let norm = normal.norm();
        if norm < 1e-9 {
            return None; // collinear sample
        }
        let n = normal / norm;
        let d = -n.dot(&p0.coords);
        Some([n.x, n.y, n.z, d])
    }

    fn compute_error(&self, model: &[f32; 4], p: &Point3<f32>) -> f64 {
        (model[0] * p.x + model[1] * p.y + model[2] * p.z + model[3]).abs() as f64
    }
}

/// Segment the dominant plane with RANSAC.
/// Returns the plane `[a, b, c, d]` and the inlier indices.
pub fn segment_plane(
    pc: &PointCloud,
    distance_threshold: f32,
    ransac_n: usize,
    num_iterations: usize,
) -> (Option<[f32; 4]>, Vec<usize>) {
    if pc.points.len() < ransac_n || ransac_n < 3 {
        return (None, Vec::new());
    }

    let config = RobustConfig {
        threshold: distance_threshold as f64,
        max_iterations: num_iterations,
        confidence: 0.99,
        min_sample_size: ransac_n,
    };

    let ransac = Ransac::new(config);
    let res = ransac.run(&PlaneEstimator, &pc.points);

    let inlier_indices: Vec<usize> = res
        .inliers
        .iter()
        .enumerate()
        .filter(|(_, &is_inlier)| is_inlier)
        .map(|(i, _)| i)
        .collect();

    (res.model, inlier_indices)
}

/// DBSCAN clustering over Euclidean distance.
/// Returns a label per point; -1 marks noise.
pub fn cluster_dbscan(pc: &PointCloud, eps: f32, min_points: usize) -> Vec<i32> {
    let n = pc.len();
    let mut labels = vec![-1i32; n];
    let mut cluster_idx = 0;

    let tree = build_index(pc);
    let eps2 = eps * eps;
    let mut visited = vec![false; n];

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let p = pc.points[i];
        let query = [p.x, p.y, p.z];
        let neighbors: Vec<usize> = tree
            .locate_within_distance(query, eps2)
            .map(|e| e.index)
            .collect();

        if neighbors.len() < min_points {
            continue; // stays noise unless claimed as a border point later
        }

        labels[i] = cluster_idx;
        let mut seeds = neighbors;
        let mut head = 0;
        while head < seeds.len() {
            let current = seeds[head];
            head += 1;

            if labels[current] == -1 {
                labels[current] = cluster_idx;
            }
            if !visited[current] {
                visited[current] = true;
                labels[current] = cluster_idx;

                let q = pc.points[current];
                let neighborhood: Vec<usize> = tree
                    .locate_within_distance([q.x, q.y, q.z], eps2)
                    .map(|e| e.index)
                    .collect();
                if neighborhood.len() >= min_points {
                    seeds.extend(neighborhood);
                }
            }
        }
        cluster_idx += 1;
    }

    labels
}

/// Mean absolute point-to-plane distance of the given indices.
pub fn plane_fit_error(pc: &PointCloud, plane: &[f32; 4], indices: &[usize]) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    let sum: f32 = indices
        .iter()
        .map(|&i| {
            let p = pc.points[i];
            (plane[0] * p.x + plane[1] * p.y + plane[2] * p.z + plane[3]).abs()
        })
        .sum();
    sum / indices.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Grid plane z = 0 plus scattered off-plane points.
    fn plane_with_noise() -> PointCloud {
        let mut points = Vec::new();
        for y in 0..12 {
            for x in 0..12 {
                points.push(Point3::new(x as f32 * 0.1, y as f32 * 0.1, 0.0));
            }
        }
        for i in 0..20 {
            let t = i as f32;
            points.push(Point3::new(
                (t * 0.37).sin() * 0.8,
                (t * 0.53).cos() * 0.8,
                0.5 + 0.1 * t,
            ));
        }
        PointCloud::new(points)
    }

    #[test]
    fn ransac_finds_the_plane() {
        let pc = plane_with_noise();
        let (model, inliers) = segment_plane(&pc, 0.02, 3, 300);
        let plane = model.unwrap();

        assert!(inliers.len() >= 140, "only {} inliers", inliers.len());
        // Unit normal along +-z, offset ~0.
        assert!(plane[2].abs() > 0.99);
        assert!(plane[3].abs() < 0.02);
        assert!(plane_fit_error(&pc, &plane, &inliers) < 0.02);
    }

    #[test]
    fn degenerate_input_returns_none() {
        let pc = PointCloud::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let (model, inliers) = segment_plane(&pc, 0.1, 3, 50);
        assert!(model.is_none());
        assert!(inliers.is_empty());
    }

    #[test]
    fn dbscan_separates_two_blobs() {
        let mut points = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                points.push(Point3::new(x as f32 * 0.05, y as f32 * 0.05, 0.0));
                points.push(Point3::new(5.0 + x as f32 * 0.05, y as f32 * 0.05, 0.0));
            }
        }
        // One isolated noise point between the blobs.
        points.push(Point3::new(2.5, 2.5, 0.0));
        let pc = PointCloud::new(points);

        let labels = cluster_dbscan(&pc, 0.12, 4);
        let clusters: std::collections::HashSet<i32> =
            labels.iter().copied().filter(|&l| l >= 0).collect();
        assert_eq!(clusters.len(), 2);
        assert_eq!(labels[labels.len() - 1], -1);
    }
}
