use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use super::NoiseParams;
use crate::filter::gaussian_blur;
use crate::grid::Grid;

/// Smallest blur radius an octave may use; finer layers are pure pixel noise.
const MIN_OCTAVE_SIGMA: f64 = 0.6;

/// Vectorized fractal Brownian motion: each octave is white Gaussian noise blurred
/// to a radius that halves per octave, normalized to unit std and weighted by
/// `persistence^k`. The sum is divided by its peak magnitude, so output is in `[-1, 1]`.
pub fn fbm_field(w: usize, h: usize, params: &NoiseParams, rng: &mut ChaCha8Rng) -> Grid<f32> {
    let mut acc = Grid::<f32>::new(w, h);
    let mut sigma = params.base_sigma();

    for amp in octave_weights(params.persistence, params.octaves) {
        let mut layer = white_noise(w, h, rng);
        gaussian_blur(&mut layer, sigma.max(MIN_OCTAVE_SIGMA) as f32);
        let std = nonzero_or_one(layer.std_dev());
        acc.data
            .par_iter_mut()
            .zip(layer.data.par_iter())
            .for_each(|(a, &n)| *a += amp * (n / std));
        sigma /= 2.0;
    }

    let peak = nonzero_or_one(acc.max_abs());
    acc.data.par_iter_mut().for_each(|v| *v /= peak);
    acc
}

/// `persistence^k` for each octave, rescaled so the largest weight is one.
/// Worked in log space so huge persistence or octave counts stay finite; the
/// common factor cancels in the final peak division.
fn octave_weights(persistence: f64, octaves: u32) -> Vec<f32> {
    let n = octaves as usize;
    let mag = persistence.abs();
    if !(mag > 0.0 && mag.is_finite()) {
        let mut weights = vec![0.0; n];
        if let Some(first) = weights.first_mut() {
            *first = 1.0;
        }
        return weights;
    }
    let ln = mag.ln();
    let top = if ln > 0.0 { octaves.saturating_sub(1) as f64 * ln } else { 0.0 };
    (0..octaves)
        .map(|k| {
            let w = (k as f64 * ln - top).exp();
            let signed = if persistence < 0.0 && k % 2 == 1 { -w } else { w };
            signed as f32
        })
        .collect()
}

/// Standard-normal samples drawn row by row from the generation RNG.
fn white_noise(w: usize, h: usize, rng: &mut ChaCha8Rng) -> Grid<f32> {
    let mut g = Grid::<f32>::new(w, h);
    for v in g.data.iter_mut() {
        *v = rng.sample(StandardNormal);
    }
    g
}

#[inline]
fn nonzero_or_one(v: f32) -> f32 {
    if v > 0.0 && v.is_finite() { v } else { 1.0 }
}
