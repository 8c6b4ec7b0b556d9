//! Seed normalization and the one seeded RNG each generation call owns.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::config::PipelineConfig;

/// Period of the z offset derived from the seed; keeps the sample plane near the origin.
const Z_OFFSET_PERIOD: u32 = 100_000;
/// Perlin permutation seeds are taken modulo a 31-bit prime.
const PERLIN_BASE_MODULUS: u32 = 2_147_483_647;

/// Fold any integer seed into `[seed_min, seed_max)`: absolute value, modulo
/// `seed_max`, then lifted to `seed_min` if it landed below it.
pub fn normalize_seed(seed: i64, cfg: &PipelineConfig) -> u32 {
    let max = cfg.seed_max.max(1) as u64;
    let folded = (seed.unsigned_abs() % max) as u32;
    folded.max(cfg.seed_min)
}

/// Best-effort integer coercion of a loosely typed seed (JSON number or numeric string).
/// Floats truncate toward zero, out-of-range floats saturate. Callers fall back to
/// `seed_min` on `None`.
pub fn coerce_seed(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_u64()
                .map(|u| u as i64)
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

/// Third coordinate of the pointwise noise plane.
#[inline]
pub fn z_offset(seed: u32) -> f64 {
    (seed % Z_OFFSET_PERIOD) as f64 / 100.0
}

/// Permutation-table selector for the coherent-noise backend.
#[inline]
pub fn perlin_base(seed: u32) -> u32 {
    seed % PERLIN_BASE_MODULUS
}

/// Instance-scoped generator, reseeded at the start of every generation.
pub fn seeded_rng(seed: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}
