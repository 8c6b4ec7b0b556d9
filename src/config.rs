use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::synth::Backend;

/// Intuitive controls for one generation call, exposed as UI sliders in the frontend.
/// Range checks (roughness 0-100, crater size 0.1-1.0, ...) belong to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    // Base relief
    pub terrain_roughness: i32,
    pub height_variation: f32,
    pub seed: i64,

    // Craters
    pub crater_enabled: bool,
    pub num_craters: u32,
    pub crater_size: f32,
    pub crater_depth: f32,

    // Pedestal added after carving
    pub base_height: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            terrain_roughness: 50,
            height_variation: 8.0,
            seed: 42,
            crater_enabled: false,
            num_craters: 3,
            crater_size: 0.5,
            crater_depth: 0.6,
            base_height: 20.0,
        }
    }
}

/// Robustness limits and backend preference, fixed per generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub noise_backend: Backend,
    pub seed_min: u32,
    pub seed_max: u32,
    pub max_octaves: u32,
    /// Above this many cells the pointwise backend is swapped for fBm.
    pub perlin_max_pixels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            noise_backend: Backend::Fbm,
            seed_min: 1,
            seed_max: 10_000_000,
            max_octaves: 7,
            perlin_max_pixels: 160_000,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `NOISE_BACKEND`, `SEED_MIN`, `SEED_MAX`, `MAX_OCTAVES`
    /// and `PERLIN_MAX_PIXELS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`], reading knobs through `lookup`.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let knob = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();
        if let Some(backend) = knob("NOISE_BACKEND") {
            cfg.noise_backend = backend.parse()?;
        }
        if let Some(v) = knob("SEED_MIN") {
            cfg.seed_min = parse_knob("SEED_MIN", &v)?;
        }
        if let Some(v) = knob("SEED_MAX") {
            cfg.seed_max = parse_knob("SEED_MAX", &v)?;
        }
        if let Some(v) = knob("MAX_OCTAVES") {
            cfg.max_octaves = parse_knob("MAX_OCTAVES", &v)?;
        }
        if let Some(v) = knob("PERLIN_MAX_PIXELS") {
            cfg.perlin_max_pixels = parse_knob("PERLIN_MAX_PIXELS", &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.noise_backend = backend;
        self
    }

    pub fn with_perlin_max_pixels(mut self, pixels: usize) -> Self {
        self.perlin_max_pixels = pixels;
        self
    }

    /// Rejects limits that would make seed reduction or octave clamping meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.seed_max <= self.seed_min {
            return Err(Error::InvalidConfig(format!(
                "SEED_MAX ({}) must be greater than SEED_MIN ({})",
                self.seed_max, self.seed_min
            )));
        }
        if self.max_octaves == 0 {
            return Err(Error::InvalidConfig("MAX_OCTAVES must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_knob<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::InvalidConfig(format!("{key}={raw:?} is not a valid number")))
}
