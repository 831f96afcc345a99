use crate::canny;
use image::GrayImage;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// A line in normal form: x*cos(theta) + y*sin(theta) = rho.
#[derive(Debug, Clone, Copy)]
pub struct HoughLine {
    pub rho: f32,
    pub theta: f32,
    pub votes: u32,
}

/// Standard Hough line transform over the Canny edges of `src`.
/// Lines with at least `threshold` votes are returned sorted by votes.
pub fn hough_lines(
    src: &GrayImage,
    rho_res: f32,
    theta_res: f32,
    threshold: u32,
) -> Vec<HoughLine> {
    let edges = canny(src, 50, 150);
    hough_lines_on_edges(&edges, rho_res, theta_res, threshold)
}

/// Accumulate votes directly from a binary edge image.
pub fn hough_lines_on_edges(
    edges: &GrayImage,
    rho_res: f32,
    theta_res: f32,
    threshold: u32,
) -> Vec<HoughLine> {
    let width = edges.width() as usize;
    let height = edges.height() as usize;

    let max_rho = ((width * width + height * height) as f32).sqrt();
    let num_rho = (max_rho / rho_res).ceil() as usize * 2;
    let num_theta = (std::f32::consts::PI / theta_res).ceil() as usize;

    // Precompute the trig table once per call.
    let trig: Vec<(f32, f32)> = (0..num_theta)
        .map(|t| {
            let theta = t as f32 * theta_res;
            (theta.cos(), theta.sin())
        })
        .collect();

    let acc: Vec<AtomicU32> = (0..num_rho * num_theta).map(|_| AtomicU32::new(0)).collect();

    edges.as_raw().par_iter().enumerate().for_each(|(i, &e)| {
        if e > 0 {
            let x = (i % width) as f32;
            let y = (i / width) as f32;

            for (t_idx, &(cos_t, sin_t)) in trig.iter().enumerate() {
                let rho = x * cos_t + y * sin_t;
                let rho_idx = ((rho + max_rho) / rho_res) as usize;
                if rho_idx < num_rho {
                    acc[rho_idx * num_theta + t_idx].fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    });

    let mut lines = Vec::new();
    for r_idx in 0..num_rho {
        for t_idx in 0..num_theta {
            let votes = acc[r_idx * num_theta + t_idx].load(Ordering::Relaxed);
            if votes >= threshold {
                lines.push(HoughLine {
                    rho: r_idx as f32 * rho_res - max_rho,
                    theta: t_idx as f32 * theta_res,
                    votes,
                });
            }
        }
    }

    lines.sort_by(|a, b| b.votes.cmp(&a.votes));
    lines
}
