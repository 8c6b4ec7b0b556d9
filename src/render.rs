use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rayon::prelude::*;

use crate::error::Result;
use crate::grid::Grid;

/// Grayscale preview, stretched from the grid minimum (black) to its maximum (white).
/// Flat grids render black.
pub fn render_heightmap(height: &Grid<f32>) -> Vec<u8> {
    let min_h = height.min();
    let max_h = height.max();
    let range = if max_h > min_h { max_h - min_h } else { 1.0 };
    let w = height.w;
    let mut rgba = vec![0u8; height.data.len() * 4];
    if w == 0 {
        return rgba;
    }
    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let t = (height.get(x, y) - min_h) / range;
            let v = (t * 255.0).clamp(0.0, 255.0) as u8;
            row[x * 4..x * 4 + 4].copy_from_slice(&[v, v, v, 255]);
        }
    });
    rgba
}

pub fn encode_png(rgba: &[u8], w: usize, h: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(rgba, w as u32, h as u32, ExtendedColorType::Rgba8)?;
    Ok(buf)
}

pub fn save_png(path: &Path, rgba: &[u8], w: usize, h: usize) -> Result<()> {
    image::save_buffer(path, rgba, w as u32, h as u32, image::ColorType::Rgba8)?;
    Ok(())
}
