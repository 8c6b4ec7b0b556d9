//! Raw noise synthesis: slider translation, backend selection and the two backends.

pub mod fbm;
pub mod perlin;

use std::fmt;
use std::str::FromStr;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::grid::Grid;

/// Floor for the spatial scale; roughness beyond 147.5 would otherwise reach zero.
const MIN_SCALE: f64 = 1.0;

/// Technical noise parameters derived from the roughness slider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    /// Cells per noise unit. Larger = smoother, lower-frequency terrain.
    pub scale: f64,
    pub octaves: u32,
    /// Amplitude decay per octave.
    pub persistence: f64,
}

impl NoiseParams {
    /// Roughness 0..100 maps to scale 60..20, octaves 1..6 and persistence 0.1..0.5.
    pub fn translate(terrain_roughness: i32, max_octaves: u32) -> Self {
        let r = terrain_roughness as f64;
        let scale = (60.0 - r.max(0.0) * 0.4).max(MIN_SCALE);
        let octaves = (1.0 + r * 0.05).floor().clamp(1.0, max_octaves.max(1) as f64) as u32;
        let persistence = 0.1 + r * 0.004;
        Self {
            scale,
            octaves,
            persistence,
        }
    }

    /// Initial blur radius for the fBm backend.
    pub fn base_sigma(&self) -> f64 {
        (self.scale * 0.25).max(1.0)
    }
}

/// Noise backend: per-cell coherent noise or vectorized Gaussian-filtered fBm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Perlin,
    Fbm,
}

impl Backend {
    /// Honor the preference unless pointwise noise would exceed the pixel ceiling.
    pub fn select(preferred: Backend, pixels: usize, perlin_max_pixels: usize) -> Backend {
        match preferred {
            Backend::Perlin if pixels > perlin_max_pixels => Backend::Fbm,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Perlin => "perlin",
            Backend::Fbm => "fbm",
        }
    }

    /// Raw field scaled by `height_variation`.
    pub fn synthesize(
        &self,
        w: usize,
        h: usize,
        noise: &NoiseParams,
        seed: u32,
        height_variation: f32,
        rng: &mut ChaCha8Rng,
    ) -> Grid<f32> {
        let mut field = match self {
            Backend::Perlin => perlin::perlin_field(w, h, noise, seed),
            Backend::Fbm => fbm::fbm_field(w, h, noise, rng),
        };
        for v in field.data.iter_mut() {
            *v *= height_variation;
        }
        field
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perlin" => Ok(Backend::Perlin),
            "fbm" => Ok(Backend::Fbm),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_endpoints() {
        let flat = NoiseParams::translate(0, 7);
        assert_eq!(flat.scale, 60.0);
        assert_eq!(flat.octaves, 1);
        assert!((flat.persistence - 0.1).abs() < 1e-12);

        let mid = NoiseParams::translate(50, 7);
        assert_eq!(mid.scale, 40.0);
        assert_eq!(mid.octaves, 3);
        assert!((mid.persistence - 0.3).abs() < 1e-12);

        let rough = NoiseParams::translate(100, 7);
        assert_eq!(rough.scale, 20.0);
        assert_eq!(rough.octaves, 6);
        assert!((rough.persistence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_octaves_stay_in_bounds() {
        for r in [-500, -1, 0, 19, 20, 100, 119, 120, 1000, i32::MAX] {
            let p = NoiseParams::translate(r, 7);
            assert!((1..=7).contains(&p.octaves), "roughness {r} -> {}", p.octaves);
        }
        assert_eq!(NoiseParams::translate(100, 4).octaves, 4);
        assert_eq!(NoiseParams::translate(100, 0).octaves, 1);
    }

    #[test]
    fn test_scale_never_collapses() {
        assert_eq!(NoiseParams::translate(150, 7).scale, MIN_SCALE);
        assert_eq!(NoiseParams::translate(10_000, 7).scale, MIN_SCALE);
        assert_eq!(NoiseParams::translate(-30, 7).scale, 60.0);
    }

    #[test]
    fn test_base_sigma_floor() {
        assert_eq!(NoiseParams::translate(50, 7).base_sigma(), 10.0);
        assert_eq!(NoiseParams::translate(10_000, 7).base_sigma(), 1.0);
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(Backend::select(Backend::Perlin, 4096, 1000), Backend::Fbm);
        assert_eq!(Backend::select(Backend::Perlin, 1000, 1000), Backend::Perlin);
        assert_eq!(Backend::select(Backend::Fbm, 10, 1000), Backend::Fbm);
    }

    #[test]
    fn test_backend_parse_and_display() {
        assert_eq!("PERLIN".parse::<Backend>().unwrap(), Backend::Perlin);
        assert_eq!(" fbm ".parse::<Backend>().unwrap(), Backend::Fbm);
        assert!(matches!(
            "simplex".parse::<Backend>(),
            Err(Error::UnknownBackend(_))
        ));
        assert_eq!(Backend::Fbm.to_string(), "fbm");
        assert_eq!(serde_json::to_string(&Backend::Perlin).unwrap(), "\"perlin\"");
    }
}
