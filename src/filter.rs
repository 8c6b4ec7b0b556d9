use rayon::prelude::*;

use crate::grid::Grid;

/// Fixed blur applied after synthesis to hide sampling artifacts.
pub const SMOOTH_SIGMA: f32 = 0.8;
/// Kernel half-width in standard deviations.
const TRUNCATE: f32 = 4.0;

/// Mirror an out-of-range index back into `0..n` (edge sample repeated: `c b a | a b c`).
/// Handles offsets larger than `n` by folding over the period `2n`.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn kernel(sigma: f32) -> Vec<f32> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    let k: Vec<f32> = (0..=radius)
        .map(|i| (-(i as f32 * i as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = k[0] + 2.0 * k[1..].iter().sum::<f32>();
    k.iter().map(|v| v / sum).collect()
}

/// Separable Gaussian blur with mirror boundaries on all four edges.
pub fn gaussian_blur(grid: &mut Grid<f32>, sigma: f32) {
    if !(sigma > 0.0) || grid.data.is_empty() {
        return;
    }
    let w = grid.w;
    let h = grid.h;
    let kernel = kernel(sigma);
    let radius = kernel.len() - 1;
    if radius == 0 {
        return;
    }

    // Horizontal pass
    let src = &grid.data;
    let mut tmp = vec![0.0f32; w * h];
    tmp.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let line = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut s = line[x] * kernel[0];
            for r in 1..=radius {
                s += line[reflect(x as isize - r as isize, w)] * kernel[r];
                s += line[reflect(x as isize + r as isize, w)] * kernel[r];
            }
            row[x] = s;
        }
    });

    // Vertical pass
    grid.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let mut s = tmp[y * w + x] * kernel[0];
            for r in 1..=radius {
                let uy = reflect(y as isize - r as isize, h);
                let dy = reflect(y as isize + r as isize, h);
                s += tmp[uy * w + x] * kernel[r];
                s += tmp[dy * w + x] * kernel[r];
            }
            row[x] = s;
        }
    });
}

pub fn smooth(grid: &mut Grid<f32>) {
    gaussian_blur(grid, SMOOTH_SIGMA);
}

/// Subtract the global minimum so the field starts at exactly zero.
pub fn shift_to_zero(grid: &mut Grid<f32>) {
    if grid.data.is_empty() {
        return;
    }
    let min = grid.min();
    if !min.is_finite() {
        return;
    }
    grid.data.par_iter_mut().for_each(|v| *v -= min);
}

/// Linear rescale to `[0, 1]`. Flat fields are left untouched.
pub fn rescale_unit(grid: &mut Grid<f32>) {
    let min = grid.min();
    let max = grid.max();
    if max > min {
        let range = max - min;
        grid.data.par_iter_mut().for_each(|v| *v = (*v - min) / range);
    }
}

/// Pedestal added to every cell once carving is done.
pub fn add_offset(grid: &mut Grid<f32>, offset: f32) {
    grid.data.par_iter_mut().for_each(|v| *v += offset);
}
