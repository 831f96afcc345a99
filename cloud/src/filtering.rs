use crate::build_index;
use cvkit_core::PointCloud;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use rstar::PointDistance;

/// Downsample with a voxel grid, replacing each occupied voxel by the
/// centroid of its points. Colors and normals are averaged when present.
pub fn voxel_down_sample(pc: &PointCloud, voxel_size: f32) -> PointCloud {
    if voxel_size <= 0.0 || pc.is_empty() {
        return pc.clone();
    }

    let n = pc.len();
    let mut indices: Vec<(i32, i32, i32, usize)> = Vec::with_capacity(n);
    for (i, p) in pc.points.iter().enumerate() {
        let hx = (p.x / voxel_size).floor() as i32;
        let hy = (p.y / voxel_size).floor() as i32;
        let hz = (p.z / voxel_size).floor() as i32;
        indices.push((hx, hy, hz, i));
    }

    if n > 10000 {
        indices.par_sort_unstable_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
    } else {
        indices.sort_unstable_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
    }

    let has_colors = pc.colors.is_some();
    let has_normals = pc.normals.is_some();

    let mut new_points = Vec::new();
    let mut new_colors = has_colors.then(Vec::new);
    let mut new_normals = has_normals.then(Vec::new);

    let mut current_voxel = (indices[0].0, indices[0].1, indices[0].2);
    let mut sum_p = Vector3::zeros();
    let mut sum_c = Vector3::zeros();
    let mut sum_n = Vector3::zeros();
    let mut count = 0usize;

    let mut flush = |sum_p: &Vector3<f32>,
                     sum_c: &Vector3<f32>,
                     sum_n: &Vector3<f32>,
                     count: usize,
                     new_points: &mut Vec<Point3<f32>>,
                     new_colors: &mut Option<Vec<Point3<f32>>>,
                     new_normals: &mut Option<Vec<Vector3<f32>>>| {
        let factor = 1.0 / count as f32;
        new_points.push(Point3::from(sum_p * factor));
        if let Some(nc) = new_colors {
            nc.push(Point3::from(sum_c * factor));
        }
        if let Some(nn) = new_normals {
            let mut normal = sum_n * factor;
            if normal.norm_squared() > 1e-6 {
                normal.normalize_mut();
            }
            nn.push(normal);
        }
    };

    for &(hx, hy, hz, idx) in &indices {
        if (hx, hy, hz) != current_voxel {
            flush(
                &sum_p,
                &sum_c,
                &sum_n,
                count,
                &mut new_points,
                &mut new_colors,
                &mut new_normals,
            );
            current_voxel = (hx, hy, hz);
            sum_p = Vector3::zeros();
            sum_c = Vector3::zeros();
            sum_n = Vector3::zeros();
            count = 0;
        }

        sum_p += pc.points[idx].coords;
        if let Some(colors) = &pc.colors {
            sum_c += colors[idx].coords;
        }
        if let Some(normals) = &pc.normals {
            sum_n += normals[idx];
        }
        count += 1;
    }

    if count > 0 {
        flush(
            &sum_p,
            &sum_c,
            &sum_n,
            count,
            &mut new_points,
            &mut new_colors,
            &mut new_normals,
        );
    }

    PointCloud {
        points: new_points,
        colors: new_colors,
        normals: new_normals,
    }
}

/// Remove points whose mean distance to their `k` nearest neighbors
/// exceeds the global mean by more than `std_ratio` standard deviations.
/// Returns the filtered cloud and the indices that were kept.
pub fn remove_statistical_outliers(
    pc: &PointCloud,
    k: usize,
    std_ratio: f32,
) -> (PointCloud, Vec<usize>) {
    let n = pc.len();
    if n == 0 || k == 0 {
        return (pc.clone(), (0..n).collect());
    }

    let tree = build_index(pc);

    let mean_dists: Vec<f32> = pc
        .points
        .par_iter()
        .map(|p| {
            let query = [p.x, p.y, p.z];
            // Skip the query point itself (distance 0).
            let dists: Vec<f32> = tree
                .nearest_neighbor_iter(&query)
                .skip(1)
                .take(k)
                .map(|e| e.distance_2(&query).sqrt())
                .collect();
            if dists.is_empty() {
                0.0
            } else {
                dists.iter().sum::<f32>() / dists.len() as f32
            }
        })
        .collect();

    let mean = mean_dists.iter().sum::<f32>() / n as f32;
    let var = mean_dists.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / n as f32;
    let limit = mean + std_ratio * var.sqrt();

    let kept: Vec<usize> = (0..n).filter(|&i| mean_dists[i] <= limit).collect();

    let points = kept.iter().map(|&i| pc.points[i]).collect();
    let colors = pc
        .colors
        .as_ref()
        .map(|c| kept.iter().map(|&i| c[i]).collect());
    let normals = pc
        .normals
        .as_ref()
        .map(|ns| kept.iter().map(|&i| ns[i]).collect());

    (
        PointCloud {
            points,
            colors,
            normals,
        },
        kept,
    )
}
