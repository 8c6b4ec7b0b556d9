use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Heightmap as consumed by the web 3D viewer. `z[x][y]`: the outer index runs
/// over the width, the inner one over the height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightmapPayload {
    pub width: usize,
    pub height: usize,
    pub z: Vec<Vec<f32>>,
}

impl HeightmapPayload {
    pub fn from_grid(grid: &Grid<f32>) -> Self {
        Self {
            width: grid.w,
            height: grid.h,
            z: grid.to_columns(),
        }
    }

    /// Payload for a generator that has not produced terrain yet.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            z: Vec::new(),
        }
    }
}
