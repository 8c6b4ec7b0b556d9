use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;

/// Depth every crater gets even on a perfectly flat field.
pub const ABSOLUTE_FLOOR: f32 = 5.0;
/// Share of the global relief added on top of the absolute floor.
pub const RELIEF_WEIGHT: f32 = 0.35;
pub const DEPTH_FLOOR: f32 = 0.1;
/// Pull of the patch toward its own mean before carving.
pub const FLATTEN: f32 = 0.6;
/// Maximum weight of the new crater over the existing surface (at its center).
pub const OVERWRITE: f32 = 0.85;

const BASE_RADIUS: f32 = 12.0;
const RADIUS_PER_SIZE: f32 = 25.0;
const MIN_RADIUS: i64 = 5;
/// Extra clearance kept between the rim and the grid edge when picking centers.
const EDGE_MARGIN: usize = 6;

// Radial profile shape
const FLOOR_FRACTION: f32 = 0.65;
const RIM_PEAK: f32 = 0.35;
const RIM_SIGMA: f32 = 0.15;
const RIM_GAIN: f32 = 0.8;

/// One crater, generated and discarded per carve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CraterSpec {
    pub cx: usize,
    pub cy: usize,
    pub radius: usize,
    pub rim_width: usize,
    pub amplitude: f32,
}

impl CraterSpec {
    /// Radius of the affected disc, rim included.
    pub fn outer_radius(&self) -> usize {
        self.radius + self.rim_width
    }
}

/// Depth of the crater floor: absolute floor plus a relief-relative share,
/// scaled by the depth control.
pub fn crater_amplitude(relief: f32, crater_depth: f32) -> f32 {
    let relief = if relief > 0.0 && relief.is_finite() { relief } else { 1.0 };
    let depth = if crater_depth.is_finite() { crater_depth } else { DEPTH_FLOOR };
    (ABSOLUTE_FLOOR + relief * RELIEF_WEIGHT) * depth.clamp(DEPTH_FLOOR, 1.0)
}

/// Bowl radius in cells, kept at least 5 and small enough to fit the grid.
pub fn crater_radius(crater_size: f32, w: usize, h: usize) -> usize {
    let wanted = (BASE_RADIUS + crater_size * RADIUS_PER_SIZE) as i64;
    let fit = (w.min(h) / 2) as i64 - 2;
    wanted.min(fit).max(MIN_RADIUS) as usize
}

pub fn rim_width(radius: usize) -> usize {
    ((0.25 * radius as f32).round() as usize).max(2)
}

/// Height delta at distance `r` from the center: flat floor, smoothstep wall,
/// Gaussian rim just outside the bowl, nothing beyond.
pub fn crater_profile(r: f32, radius: usize, rim_w: usize, amp: f32) -> f32 {
    let big_r = radius as f32;
    let r0 = FLOOR_FRACTION * big_r;
    if r <= r0 {
        -amp
    } else if r <= big_r {
        let t = (r - r0) / (big_r - r0);
        -amp * (1.0 - (3.0 * t * t - 2.0 * t * t * t))
    } else if r <= big_r + rim_w as f32 {
        let tr = (r - big_r) / rim_w as f32;
        let bell = (-(tr - RIM_PEAK).powi(2) / (2.0 * RIM_SIGMA * RIM_SIGMA)).exp();
        RIM_GAIN * amp * bell
    } else {
        0.0
    }
}

/// Pick a uniform center that keeps the whole crater plus margin inside the grid,
/// or the grid center when the grid is too small for that.
pub fn place_crater(
    w: usize,
    h: usize,
    radius: usize,
    amplitude: f32,
    rng: &mut ChaCha8Rng,
) -> CraterSpec {
    let rim_w = rim_width(radius);
    let margin = EDGE_MARGIN + radius + rim_w;
    let (cx, cy) = if w <= 2 * margin || h <= 2 * margin {
        (w / 2, h / 2)
    } else {
        let cx = rng.gen_range(margin..w - margin);
        let cy = rng.gen_range(margin..h - margin);
        (cx, cy)
    };
    CraterSpec {
        cx,
        cy,
        radius,
        rim_width: rim_w,
        amplitude,
    }
}

/// Blend one crater into the field. The patch is first pulled toward its mean,
/// then overwritten with `mean + profile` with a weight falling from 0.85 at the
/// center to 0 at the rim edge. Reads the field as left by earlier craters, so
/// the newest crater wins where they overlap.
pub fn carve_crater(grid: &mut Grid<f32>, spec: &CraterSpec) {
    let (w, h) = grid.shape();
    if w == 0 || h == 0 {
        return;
    }
    let outer = spec.outer_radius();
    let outer_f = outer as f32;
    let x0 = spec.cx.saturating_sub(outer);
    let x1 = (spec.cx + outer + 1).min(w);
    let y0 = spec.cy.saturating_sub(outer);
    let y1 = (spec.cy + outer + 1).min(h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let mut sum = 0.0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += grid.get(x, y) as f64;
        }
    }
    let baseline = (sum / ((x1 - x0) * (y1 - y0)) as f64) as f32;

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 - spec.cx as f32;
            let dy = y as f32 - spec.cy as f32;
            let r = (dx * dx + dy * dy).sqrt();
            if r > outer_f {
                continue;
            }
            let flat = (1.0 - FLATTEN) * grid.get(x, y) + FLATTEN * baseline;
            let weight = OVERWRITE * (1.0 - (r / outer_f).powi(2)).clamp(0.0, 1.0);
            let target = baseline + crater_profile(r, spec.radius, spec.rim_width, spec.amplitude);
            grid.set(x, y, flat * (1.0 - weight) + target * weight);
        }
    }
}

/// Place and carve `count` craters in sequence. Amplitude is fixed from the
/// relief measured once, before the first crater.
pub fn carve_craters(
    grid: &mut Grid<f32>,
    count: u32,
    crater_size: f32,
    crater_depth: f32,
    rng: &mut ChaCha8Rng,
) -> Vec<CraterSpec> {
    if count == 0 {
        return Vec::new();
    }
    let (w, h) = grid.shape();
    let amplitude = crater_amplitude(grid.relief(), crater_depth);
    let radius = crater_radius(crater_size, w, h);

    (0..count)
        .map(|i| {
            let spec = place_crater(w, h, radius, amplitude, rng);
            debug!(
                "crater {i}: center=({}, {}) R={} rim={} amp={:.3}",
                spec.cx, spec.cy, spec.radius, spec.rim_width, spec.amplitude
            );
            carve_crater(grid, &spec);
            spec
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn test_amplitude_has_absolute_floor() {
        // Zero relief is treated as 1.0
        assert!((crater_amplitude(0.0, 1.0) - 5.35).abs() < 1e-5);
        assert!((crater_amplitude(10.0, 0.5) - 4.25).abs() < 1e-5);
        // depth clamps to [0.1, 1.0]
        assert_eq!(crater_amplitude(10.0, 0.0), crater_amplitude(10.0, 0.1));
        assert_eq!(crater_amplitude(10.0, 5.0), crater_amplitude(10.0, 1.0));
        assert_eq!(crater_amplitude(10.0, f32::NAN), crater_amplitude(10.0, 0.1));
        assert_eq!(crater_amplitude(f32::NAN, 1.0), crater_amplitude(0.0, 1.0));
    }

    #[test]
    fn test_radius_clamps() {
        assert_eq!(crater_radius(0.5, 200, 200), 24);
        assert_eq!(crater_radius(1.0, 200, 200), 37);
        // limited by the grid
        assert_eq!(crater_radius(1.0, 40, 200), 18);
        // never below five
        assert_eq!(crater_radius(0.5, 8, 8), 5);
        assert_eq!(crater_radius(-10.0, 200, 200), 5);
        assert_eq!(crater_radius(f32::NAN, 200, 200), 5);
    }

    #[test]
    fn test_rim_width() {
        assert_eq!(rim_width(5), 2);
        assert_eq!(rim_width(24), 6);
        assert_eq!(rim_width(37), 9);
    }

    #[test]
    fn test_profile_shape() {
        let amp = 4.0;
        let (radius, rim) = (20, 5);
        assert_eq!(crater_profile(0.0, radius, rim, amp), -amp);
        assert_eq!(crater_profile(12.0, radius, rim, amp), -amp);
        // wall rises monotonically to zero at R
        let a = crater_profile(15.0, radius, rim, amp);
        let b = crater_profile(18.0, radius, rim, amp);
        assert!(-amp < a && a < b && b < 0.0);
        assert!(crater_profile(20.0, radius, rim, amp).abs() < 1e-6);
        // rim peaks near 0.35 of the band
        let peak = crater_profile(20.0 + 0.35 * 5.0, radius, rim, amp);
        assert!((peak - 0.8 * amp).abs() < 1e-4);
        assert!(crater_profile(21.0, radius, rim, amp) > 0.0);
        assert_eq!(crater_profile(25.5, radius, rim, amp), 0.0);
    }

    #[test]
    fn test_small_grid_uses_center() {
        let mut rng = seeded_rng(1);
        let spec = place_crater(40, 30, 10, 1.0, &mut rng);
        assert_eq!((spec.cx, spec.cy), (20, 15));
    }

    #[test]
    fn test_center_respects_margin() {
        let mut rng = seeded_rng(5);
        for _ in 0..50 {
            let spec = place_crater(200, 160, 10, 1.0, &mut rng);
            let margin = 6 + spec.outer_radius();
            assert!(spec.cx >= margin && spec.cx < 200 - margin);
            assert!(spec.cy >= margin && spec.cy < 160 - margin);
        }
    }

    #[test]
    fn test_crater_visible_on_flat_field() {
        let mut grid = Grid::<f32>::new(64, 64);
        let mut rng = seeded_rng(42);
        let specs = carve_craters(&mut grid, 1, 0.5, 0.6, &mut rng);
        assert_eq!(specs.len(), 1);
        assert!(grid.relief() > 0.0);
        let c = specs[0];
        assert!(grid.get(c.cx, c.cy) < 0.0);
    }

    #[test]
    fn test_relief_measured_once_before_carving() {
        let mut grid = Grid::<f32>::new(140, 140);
        for y in 0..140 {
            for x in 0..140 {
                grid.set(x, y, x as f32 * 0.1);
            }
        }
        let before = grid.relief();
        let expected = crater_amplitude(before, 0.7);

        let specs = carve_craters(&mut grid, 3, 0.3, 0.7, &mut seeded_rng(11));
        assert_eq!(specs.len(), 3);
        // carving deepens the field, so a per-crater measurement would drift
        assert!(grid.relief() > before);
        assert!(crater_amplitude(grid.relief(), 0.7) > expected);
        assert!(specs.iter().all(|s| s.amplitude == expected));
    }

    #[test]
    fn test_zero_craters_is_noop() {
        let mut grid = Grid::filled(32, 32, 1.5f32);
        let before = grid.clone();
        let specs = carve_craters(&mut grid, 0, 0.5, 0.5, &mut seeded_rng(1));
        assert!(specs.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_crater_clipped_at_corner() {
        let mut grid = Grid::<f32>::new(20, 20);
        let spec = CraterSpec {
            cx: 0,
            cy: 19,
            radius: 8,
            rim_width: 2,
            amplitude: 3.0,
        };
        carve_crater(&mut grid, &spec);
        assert!(grid.is_finite());
        assert!(grid.get(0, 19) < 0.0);
        assert_eq!(grid.get(19, 0), 0.0);
    }

    #[test]
    fn test_newest_crater_dominates_overlap() {
        let amp = crater_amplitude(0.0, 1.0);
        let (radius, rim) = (24, rim_width(24));
        let first = CraterSpec {
            cx: 30,
            cy: 48,
            radius,
            rim_width: rim,
            amplitude: amp,
        };
        let second = CraterSpec { cx: 56, ..first };

        let mut grid = Grid::<f32>::new(112, 96);
        carve_crater(&mut grid, &first);
        carve_crater(&mut grid, &second);

        // At the second center, the first crater prescribes its rim, the second its floor.
        let (px, py) = (second.cx, second.cy);
        let d_first = (px as f32 - first.cx as f32).abs();
        let from_first = crater_profile(d_first, radius, rim, amp);
        let from_second = crater_profile(0.0, radius, rim, amp);
        assert!(from_first > 0.0 && from_second < 0.0);

        let v = grid.get(px, py);
        assert!((v - from_second).abs() < (v - from_first).abs());

        // Swapping the order flips which profile wins at the same point.
        let mut swapped = Grid::<f32>::new(112, 96);
        carve_crater(&mut swapped, &second);
        carve_crater(&mut swapped, &first);
        assert!(swapped.get(px, py) > v);
    }
}
