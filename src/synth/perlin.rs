use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

use super::NoiseParams;
use crate::grid::Grid;
use crate::rng::{perlin_base, z_offset};

const LACUNARITY: f64 = 2.0;
/// Sample coordinates wrap at this period so huge inputs never leave the lattice.
const PERIOD: f64 = 1024.0;

/// Pointwise 3D coherent noise sampled at `(x / scale, y / scale, z_offset)`.
/// One noise evaluation per cell and octave; meant for grids under the pixel ceiling.
pub fn perlin_field(w: usize, h: usize, params: &NoiseParams, seed: u32) -> Grid<f32> {
    let noise: Fbm<Perlin> = Fbm::new(perlin_base(seed))
        .set_octaves(params.octaves as usize)
        .set_frequency(1.0)
        .set_lacunarity(LACUNARITY)
        .set_persistence(params.persistence);
    let z = z_offset(seed).rem_euclid(PERIOD);
    let scale = params.scale;

    let mut field = Grid::<f32>::new(w, h);
    field
        .data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let py = (y as f64 / scale).rem_euclid(PERIOD);
            for (x, cell) in row.iter_mut().enumerate() {
                let px = (x as f64 / scale).rem_euclid(PERIOD);
                *cell = noise.get([px, py, z]) as f32;
            }
        });
    field
}
