pub mod config;
pub mod craters;
pub mod error;
pub mod filter;
pub mod grid;
pub mod payload;
pub mod render;
pub mod rng;
pub mod synth;

use std::time::Instant;

use log::{debug, info, warn};

pub use config::{GenerationParameters, PipelineConfig};
pub use error::{Error, Result};
pub use grid::Grid;
pub use payload::HeightmapPayload;
pub use synth::{Backend, NoiseParams};

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Owns one terrain buffer of fixed size and regenerates it wholesale on each call.
/// Not meant to be shared: at most one generation in flight per instance.
pub struct TerrainGenerator {
    width: usize,
    height: usize,
    config: PipelineConfig,
    terrain: Option<Grid<f32>>,
    last_backend: Option<Backend>,
    last_seed: Option<u32>,
}

impl TerrainGenerator {
    pub fn new(width: usize, height: usize, config: PipelineConfig) -> Result<Self> {
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(Error::InvalidDimensions { width, height });
        }
        config.validate()?;
        Ok(Self {
            width,
            height,
            config,
            terrain: None,
            last_backend: None,
            last_seed: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Latest terrain, generated or injected.
    pub fn terrain(&self) -> Option<&Grid<f32>> {
        self.terrain.as_ref()
    }

    /// Backend that produced the latest terrain; `None` before the first
    /// generation or after an injected heightmap.
    pub fn last_backend(&self) -> Option<Backend> {
        self.last_backend
    }

    /// Normalized seed used by the latest generation.
    pub fn last_seed(&self) -> Option<u32> {
        self.last_seed
    }

    /// Run the full pipeline:
    /// seed → translate → select backend → synthesize → smooth → normalize
    /// → craters → base height.
    pub fn generate(&mut self, params: &GenerationParameters) -> Vec<Timing> {
        let mut timings = Vec::new();
        let total_start = Instant::now();
        let (w, h) = (self.width, self.height);

        // 1. Seed + slider translation + backend choice
        let seed = rng::normalize_seed(params.seed, &self.config);
        let mut rng = rng::seeded_rng(seed);
        let noise = NoiseParams::translate(params.terrain_roughness, self.config.max_octaves);
        let backend = Backend::select(self.config.noise_backend, w * h, self.config.perlin_max_pixels);
        if backend != self.config.noise_backend {
            warn!(
                "{}x{} = {} px exceeds perlin ceiling of {}, using {}",
                w,
                h,
                w * h,
                self.config.perlin_max_pixels,
                backend
            );
        }
        info!(
            "generating {}x{} terrain: backend={} seed={} (input {}) scale={:.1} octaves={} persistence={:.3}",
            w, h, backend, seed, params.seed, noise.scale, noise.octaves, noise.persistence
        );

        let height_variation = finite_or(params.height_variation, 0.0, "height_variation");
        let base_height = finite_or(params.base_height, 0.0, "base_height");

        // 2. Raw noise field
        let t = Instant::now();
        let mut terrain = backend.synthesize(w, h, &noise, seed, height_variation, &mut rng);
        timings.push(Timing {
            name: "synthesize",
            ms: t.elapsed().as_secs_f64() * 1000.0,
        });

        // 3. Smooth away sampling artifacts
        let t = Instant::now();
        filter::smooth(&mut terrain);
        timings.push(Timing {
            name: "smooth",
            ms: t.elapsed().as_secs_f64() * 1000.0,
        });

        // 4. Floor at zero before carving
        let t = Instant::now();
        filter::shift_to_zero(&mut terrain);
        timings.push(Timing {
            name: "normalize",
            ms: t.elapsed().as_secs_f64() * 1000.0,
        });

        // 5. Craters, newest on top
        if params.crater_enabled && params.num_craters > 0 {
            let t = Instant::now();
            let specs = craters::carve_craters(
                &mut terrain,
                params.num_craters,
                params.crater_size,
                params.crater_depth,
                &mut rng,
            );
            timings.push(Timing {
                name: "craters",
                ms: t.elapsed().as_secs_f64() * 1000.0,
            });
            debug!("carved {} craters", specs.len());
        }

        // 6. Pedestal, strictly after carving
        let t = Instant::now();
        filter::add_offset(&mut terrain, base_height);
        timings.push(Timing {
            name: "base_offset",
            ms: t.elapsed().as_secs_f64() * 1000.0,
        });

        let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        timings.push(Timing {
            name: "TOTAL",
            ms: total_ms,
        });
        for t in &timings {
            debug!("{:12} {:8.2} ms", t.name, t.ms);
        }

        self.terrain = Some(terrain);
        self.last_backend = Some(backend);
        self.last_seed = Some(seed);
        timings
    }

    /// Replace the terrain with an external heightmap laid out as `z[x][y]`.
    /// With `normalize`, values are rescaled linearly to `[0, 1]` (flat input is kept).
    /// The generator adopts the heightmap's dimensions.
    pub fn set_heightmap(&mut self, z: &[Vec<f32>], normalize: bool) -> Result<()> {
        let mut grid = Grid::<f32>::from_columns(z).ok_or_else(|| {
            Error::InvalidHeightmap("expected a non-empty rectangular array".into())
        })?;
        if !grid.is_finite() {
            return Err(Error::InvalidHeightmap("contains NaN or infinite values".into()));
        }
        if normalize {
            filter::rescale_unit(&mut grid);
        }
        info!("heightmap injected: {}x{} (normalize={})", grid.w, grid.h, normalize);
        self.width = grid.w;
        self.height = grid.h;
        self.terrain = Some(grid);
        self.last_backend = None;
        self.last_seed = None;
        Ok(())
    }

    /// Serialized form for the web viewer; `z` is empty until terrain exists.
    pub fn heightmap_payload(&self) -> HeightmapPayload {
        match &self.terrain {
            Some(grid) => HeightmapPayload::from_grid(grid),
            None => HeightmapPayload::empty(self.width, self.height),
        }
    }
}

fn finite_or(v: f32, fallback: f32, name: &str) -> f32 {
    if v.is_finite() {
        v
    } else {
        warn!("{name} is not finite ({v}), using {fallback}");
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_params() -> GenerationParameters {
        GenerationParameters {
            base_height: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let err = TerrainGenerator::new(0, 10, PipelineConfig::default()).err();
        assert!(matches!(err, Some(Error::InvalidDimensions { width: 0, height: 10 })));
        assert!(TerrainGenerator::new(10, 0, PipelineConfig::default()).is_err());
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        let err = TerrainGenerator::new(usize::MAX, 2, PipelineConfig::default()).err();
        assert!(matches!(err, Some(Error::InvalidDimensions { height: 2, .. })));
    }

    #[test]
    fn test_keeps_validated_config() {
        let cfg = PipelineConfig::default().with_backend(Backend::Perlin);
        let tg = TerrainGenerator::new(8, 8, cfg.clone()).unwrap();
        assert_eq!(tg.config(), &cfg);
    }

    #[test]
    fn test_rejects_bad_config_at_construction() {
        let cfg = PipelineConfig {
            max_octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            TerrainGenerator::new(8, 8, cfg),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_timings_cover_stages() {
        let mut tg = TerrainGenerator::new(16, 16, PipelineConfig::default()).unwrap();
        let params = GenerationParameters {
            crater_enabled: true,
            num_craters: 1,
            ..Default::default()
        };
        let names: Vec<&str> = tg.generate(&params).iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["synthesize", "smooth", "normalize", "craters", "base_offset", "TOTAL"]
        );
    }

    #[test]
    fn test_base_height_is_the_floor_without_craters() {
        let mut tg = TerrainGenerator::new(24, 20, PipelineConfig::default()).unwrap();
        let params = GenerationParameters {
            base_height: 12.5,
            ..Default::default()
        };
        tg.generate(&params);
        let t = tg.terrain().unwrap();
        assert!((t.min() - 12.5).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_height_variation_is_clamped() {
        let mut tg = TerrainGenerator::new(16, 16, PipelineConfig::default()).unwrap();
        let params = GenerationParameters {
            height_variation: f32::NAN,
            ..flat_params()
        };
        tg.generate(&params);
        let t = tg.terrain().unwrap();
        assert!(t.is_finite());
        assert_eq!(t.relief(), 0.0);
    }

    #[test]
    fn test_records_last_seed() {
        let mut tg = TerrainGenerator::new(8, 8, PipelineConfig::default()).unwrap();
        assert_eq!(tg.last_seed(), None);
        tg.generate(&GenerationParameters {
            seed: -10_000_042,
            ..Default::default()
        });
        assert_eq!(tg.last_seed(), Some(42));
        assert_eq!(tg.last_backend(), Some(Backend::Fbm));
    }

    #[test]
    fn test_set_heightmap_normalizes_and_resizes() {
        let mut tg = TerrainGenerator::new(8, 8, PipelineConfig::default()).unwrap();
        tg.generate(&flat_params());
        let z = vec![vec![2.0, 4.0, 6.0], vec![10.0, 6.0, 2.0]];
        tg.set_heightmap(&z, true).unwrap();
        assert_eq!((tg.width(), tg.height()), (2, 3));
        assert_eq!(tg.last_backend(), None);
        let payload = tg.heightmap_payload();
        assert_eq!(payload.z, vec![vec![0.0, 0.25, 0.5], vec![1.0, 0.5, 0.0]]);
    }

    #[test]
    fn test_set_heightmap_keeps_raw_values_and_flat_input() {
        let mut tg = TerrainGenerator::new(4, 4, PipelineConfig::default()).unwrap();
        tg.set_heightmap(&[vec![3.0, 9.0]], false).unwrap();
        assert_eq!(tg.heightmap_payload().z, vec![vec![3.0, 9.0]]);
        tg.set_heightmap(&[vec![5.0, 5.0], vec![5.0, 5.0]], true).unwrap();
        assert_eq!(tg.heightmap_payload().z, vec![vec![5.0, 5.0], vec![5.0, 5.0]]);
    }

    #[test]
    fn test_set_heightmap_rejects_bad_input() {
        let mut tg = TerrainGenerator::new(4, 4, PipelineConfig::default()).unwrap();
        assert!(matches!(
            tg.set_heightmap(&[vec![1.0], vec![1.0, 2.0]], true),
            Err(Error::InvalidHeightmap(_))
        ));
        assert!(tg.set_heightmap(&[], true).is_err());
        assert!(tg.set_heightmap(&[vec![f32::NAN]], false).is_err());
        // failed injections leave the generator untouched
        assert_eq!((tg.width(), tg.height()), (4, 4));
        assert!(tg.terrain().is_none());
    }

    #[test]
    fn test_payload_before_generation_is_empty() {
        let tg = TerrainGenerator::new(160, 90, PipelineConfig::default()).unwrap();
        let p = tg.heightmap_payload();
        assert_eq!((p.width, p.height), (160, 90));
        assert!(p.z.is_empty());
    }
}
