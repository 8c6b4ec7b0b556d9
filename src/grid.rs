/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Cell `(x, y)` lives at `data[y * w + x]`, with `x < w` and `y < h`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    pub fn filled(w: usize, h: usize, v: T) -> Self {
        Self {
            data: vec![v; w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}

impl Grid<f32> {
    pub fn min(&self) -> f32 {
        self.data.iter().cloned().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Peak-to-trough range. Zero for an empty or flat grid.
    pub fn relief(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.max() - self.min()
    }

    /// Population standard deviation (no Bessel correction).
    pub fn std_dev(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let n = self.data.len() as f64;
        let mean = self.data.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        var.sqrt() as f32
    }

    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, &v| m.max(v.abs()))
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Column-of-rows view with the outer index over `x`: `out[x][y]`.
    pub fn to_columns(&self) -> Vec<Vec<f32>> {
        (0..self.w)
            .map(|x| (0..self.h).map(|y| self.get(x, y)).collect())
            .collect()
    }

    /// Inverse of [`Grid::to_columns`]. Returns `None` for empty or ragged input.
    pub fn from_columns(z: &[Vec<f32>]) -> Option<Self> {
        let w = z.len();
        let h = z.first().map(|c| c.len())?;
        if w == 0 || h == 0 || z.iter().any(|c| c.len() != h) {
            return None;
        }
        let mut grid = Grid::new(w, h);
        for (x, col) in z.iter().enumerate() {
            for (y, &v) in col.iter().enumerate() {
                grid.set(x, y, v);
            }
        }
        Some(grid)
    }
}
