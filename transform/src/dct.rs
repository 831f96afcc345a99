//! 2D discrete cosine transform (orthonormal DCT-II / DCT-III).

use crate::Plane;
use rayon::prelude::*;

fn dct_1d_table(n: usize) -> Vec<f32> {
    // table[k * n + x] = c(k) * cos(pi * (2x + 1) * k / (2n))
    let mut table = vec![0.0f32; n * n];
    let c0 = (1.0 / n as f32).sqrt();
    let ck = (2.0 / n as f32).sqrt();
    for k in 0..n {
        let scale = if k == 0 { c0 } else { ck };
        for x in 0..n {
            table[k * n + x] =
                scale * ((std::f32::consts::PI * (2 * x + 1) as f32 * k as f32) / (2.0 * n as f32)).cos();
        }
    }
    table
}

fn check_even(plane: &Plane) -> crate::Result<()> {
    if plane.width == 0 || plane.height == 0 {
        return Err(crate::Error::InvalidInput("empty plane".into()));
    }
    if plane.width % 2 != 0 || plane.height % 2 != 0 {
        return Err(crate::Error::DimensionMismatch(format!(
            "DCT requires even dimensions, got {}x{}",
            plane.width, plane.height
        )));
    }
    Ok(())
}

/// Forward orthonormal 2D DCT-II. Dimensions must be even; callers pad
/// with a replicated border first if needed.
pub fn dct_2d(plane: &Plane) -> crate::Result<Plane> {
    check_even(plane)?;
    let w = plane.width;
    let h = plane.height;
    let row_table = dct_1d_table(w);
    let col_table = dct_1d_table(h);

    // Rows
    let mut rows = vec![0.0f32; w * h];
    rows.par_chunks_mut(w).enumerate().for_each(|(y, out_row)| {
        let src = &plane.data[y * w..(y + 1) * w];
        for (k, out) in out_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for x in 0..w {
                acc += src[x] * row_table[k * w + x];
            }
            *out = acc;
        }
    });

    // Columns
    let mut out = Plane::new(w, h);
    out.data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(k, out_row)| {
            for x in 0..w {
                let mut acc = 0.0f32;
                for y in 0..h {
                    acc += rows[y * w + x] * col_table[k * h + y];
                }
                out_row[x] = acc;
            }
        });

    Ok(out)
}

/// Inverse transform (DCT-III) of `dct_2d`.
pub fn idct_2d(coeffs: &Plane) -> crate::Result<Plane> {
    check_even(coeffs)?;
    let w = coeffs.width;
    let h = coeffs.height;
    let row_table = dct_1d_table(w);
    let col_table = dct_1d_table(h);

    // Columns first
    let mut cols = vec![0.0f32; w * h];
    cols.par_chunks_mut(w).enumerate().for_each(|(y, out_row)| {
        for x in 0..w {
            let mut acc = 0.0f32;
            for k in 0..h {
                acc += coeffs.data[k * w + x] * col_table[k * h + y];
            }
            out_row[x] = acc;
        }
    });

    // Rows
    let mut out = Plane::new(w, h);
    out.data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, out_row)| {
            let src = &cols[y * w..(y + 1) * w];
            for (x, out) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for k in 0..w {
                    acc += src[k] * row_table[k * w + x];
                }
                *out = acc;
            }
        });

    Ok(out)
}

/// Zero all but the `keep` x `keep` low-frequency corner, the compression
/// step of the classic DCT demo.
pub fn dct_compress(coeffs: &Plane, keep: usize) -> Plane {
    let mut out = coeffs.clone();
    for y in 0..out.height {
        for x in 0..out.width {
            if x >= keep || y >= keep {
                out.set(x, y, 0.0);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_plane(width: usize, height: usize) -> Plane {
        let data = (0..width * height)
            .map(|i| ((i * 13) % 199) as f32 / 199.0)
            .collect();
        Plane::from_vec(data, width, height).unwrap()
    }

    #[test]
    fn roundtrip_reproduces_input() {
        let plane = test_plane(16, 12);
        let coeffs = dct_2d(&plane).unwrap();
        let back = idct_2d(&coeffs).unwrap();
        for (a, b) in plane.data.iter().zip(&back.data) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn dc_coefficient_carries_mean() {
        let plane = Plane::from_vec(vec![0.5; 64], 8, 8).unwrap();
        let coeffs = dct_2d(&plane).unwrap();
        // Orthonormal DC term: mean * sqrt(w*h)
        assert!((coeffs.get(0, 0) - 0.5 * 8.0).abs() < 1e-4);
        for y in 0..8 {
            for x in 0..8 {
                if x != 0 || y != 0 {
                    assert!(coeffs.get(x, y).abs() < 1e-4);
                }
            }
        }
    }

    #[test]
    fn odd_dimensions_rejected() {
        let plane = Plane::new(7, 8);
        assert!(dct_2d(&plane).is_err());
        let plane = Plane::new(8, 9);
        assert!(idct_2d(&plane).is_err());
    }

    #[test]
    fn compression_keeps_smooth_content() {
        // A smooth horizontal ramp concentrates energy in low frequencies;
        // dropping high frequencies should reconstruct it closely.
        let w = 16;
        let h = 16;
        let data: Vec<f32> = (0..w * h).map(|i| (i % w) as f32 / w as f32).collect();
        let plane = Plane::from_vec(data, w, h).unwrap();

        let coeffs = dct_2d(&plane).unwrap();
        let compressed = dct_compress(&coeffs, 8);
        let back = idct_2d(&compressed).unwrap();

        let mse: f32 = plane
            .data
            .iter()
            .zip(&back.data)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            / plane.data.len() as f32;
        assert!(mse < 1e-2, "mse {mse}");
    }

    #[test]
    fn parseval_energy_preserved() {
        let plane = test_plane(8, 8);
        let coeffs = dct_2d(&plane).unwrap();
        let e_spatial: f32 = plane.data.iter().map(|v| v * v).sum();
        let e_freq: f32 = coeffs.data.iter().map(|v| v * v).sum();
        assert!((e_spatial - e_freq).abs() < 1e-3);
    }
}
