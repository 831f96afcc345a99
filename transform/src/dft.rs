//! 2D discrete Fourier transform via row-column FFT.

use crate::Plane;
use rustfft::{num_complex::Complex32, FftPlanner};

/// Complex frequency-domain representation of a plane.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub data: Vec<Complex32>,
    pub width: usize,
    pub height: usize,
}

impl Spectrum {
    pub fn get(&self, x: usize, y: usize) -> Complex32 {
        self.data[y * self.width + x]
    }
}

/// Smallest power of two >= n. Power-of-two sizes keep the FFT on its
/// fastest path, mirroring getOptimalDFTSize.
pub fn optimal_dft_size(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Forward 2D DFT. The input is zero-padded to optimal (power-of-two)
/// dimensions; the returned spectrum carries the padded size.
pub fn dft_2d(plane: &Plane) -> crate::Result<Spectrum> {
    if plane.width == 0 || plane.height == 0 {
        return Err(crate::Error::InvalidInput("empty plane".into()));
    }
    let width = optimal_dft_size(plane.width);
    let height = optimal_dft_size(plane.height);
    let padded = plane.padded(width, height);

    let mut data: Vec<Complex32> = padded
        .data
        .iter()
        .map(|&v| Complex32::new(v, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_forward(width);
    for row in data.chunks_mut(width) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(height);
    let mut column = vec![Complex32::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = data[y * width + x];
        }
        col_fft.process(&mut column);
        for y in 0..height {
            data[y * width + x] = column[y];
        }
    }

    Ok(Spectrum {
        data,
        width,
        height,
    })
}

/// Inverse 2D DFT with 1/(W*H) scaling, cropped back to
/// `out_width` x `out_height`.
pub fn idft_2d(spectrum: &Spectrum, out_width: usize, out_height: usize) -> crate::Result<Plane> {
    if out_width > spectrum.width || out_height > spectrum.height {
        return Err(crate::Error::DimensionMismatch(format!(
            "output {}x{} exceeds spectrum {}x{}",
            out_width, out_height, spectrum.width, spectrum.height
        )));
    }

    let width = spectrum.width;
    let height = spectrum.height;
    let mut data = spectrum.data.clone();

    let mut planner = FftPlanner::new();
    let row_ifft = planner.plan_fft_inverse(width);
    for row in data.chunks_mut(width) {
        row_ifft.process(row);
    }

    let col_ifft = planner.plan_fft_inverse(height);
    let mut column = vec![Complex32::new(0.0, 0.0); height];
    for x in 0..width {
        for y in 0..height {
            column[y] = data[y * width + x];
        }
        col_ifft.process(&mut column);
        for y in 0..height {
            data[y * width + x] = column[y];
        }
    }

    let norm = 1.0 / (width * height) as f32;
    let full = Plane::from_vec(data.iter().map(|c| c.re * norm).collect(), width, height)?;
    Ok(full.cropped(out_width, out_height))
}

/// Log-scaled magnitude spectrum, normalized to [0, 1]:
/// log(1 + |F|) / max.
pub fn magnitude_spectrum(spectrum: &Spectrum) -> Plane {
    let mut data: Vec<f32> = spectrum.data.iter().map(|c| (1.0 + c.norm()).ln()).collect();
    let max = data.iter().cloned().fold(f32::MIN, f32::max);
    if max > 0.0 {
        for v in &mut data {
            *v /= max;
        }
    }
    Plane {
        data,
        width: spectrum.width,
        height: spectrum.height,
    }
}

/// Swap quadrants diagonally so the DC component moves from the corner to
/// the center. Odd trailing rows/columns are cropped first.
pub fn fft_shift(plane: &Plane) -> Plane {
    let width = plane.width & !1usize;
    let height = plane.height & !1usize;
    let mut out = plane.cropped(width, height);
    let cx = width / 2;
    let cy = height / 2;

    for y in 0..cy {
        for x in 0..cx {
            // Q0 <-> Q3
            let a = out.get(x, y);
            let b = out.get(x + cx, y + cy);
            out.set(x, y, b);
            out.set(x + cx, y + cy, a);
            // Q1 <-> Q2
            let c = out.get(x + cx, y);
            let d = out.get(x, y + cy);
            out.set(x + cx, y, d);
            out.set(x, y + cy, c);
        }
    }

    out
}
