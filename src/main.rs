use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use topogen::{Backend, GenerationParameters, PipelineConfig, TerrainGenerator, render};

#[derive(Parser, Debug)]
#[command(name = "topogen")]
#[command(about = "Generate a cratered topographic heightmap")]
struct Args {
    /// Grid width in cells
    #[arg(short = 'W', long, default_value = "160")]
    width: usize,

    /// Grid height in cells
    #[arg(short = 'H', long, default_value = "90")]
    height: usize,

    /// Seed (any integer; folded into the configured seed range)
    #[arg(short, long, default_value = "42", allow_hyphen_values = true)]
    seed: i64,

    /// Terrain roughness, 0-100
    #[arg(short, long, default_value = "50", allow_hyphen_values = true)]
    roughness: i32,

    /// Height variation, 0-20
    #[arg(short = 'v', long, default_value = "8.0")]
    height_variation: f32,

    /// Carve craters
    #[arg(short, long)]
    craters: bool,

    /// Number of craters
    #[arg(long, default_value = "3")]
    num_craters: u32,

    /// Crater size, 0.1-1.0
    #[arg(long, default_value = "0.5")]
    crater_size: f32,

    /// Crater depth, 0.1-1.0
    #[arg(long, default_value = "0.6")]
    crater_depth: f32,

    /// Constant floor added after carving
    #[arg(long, default_value = "20.0")]
    base_height: f32,

    /// Noise backend override ("perlin" or "fbm"); defaults to NOISE_BACKEND
    #[arg(short, long)]
    backend: Option<String>,

    /// Output directory for heightmap.png and heightmap.json
    #[arg(short, long, default_value = "artifacts")]
    out_dir: PathBuf,
}

fn main() -> topogen::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = PipelineConfig::from_env()?;
    if let Some(name) = &args.backend {
        config = config.with_backend(name.parse::<Backend>()?);
    }

    let params = GenerationParameters {
        terrain_roughness: args.roughness,
        height_variation: args.height_variation,
        seed: args.seed,
        crater_enabled: args.craters,
        num_craters: args.num_craters,
        crater_size: args.crater_size,
        crater_depth: args.crater_depth,
        base_height: args.base_height,
    };

    let mut generator = TerrainGenerator::new(args.width, args.height, config)?;
    debug!("pipeline config: {:?}", generator.config());
    let timings = generator.generate(&params);

    info!("Timings:");
    for t in &timings {
        info!("  {:12} {:8.1} ms", t.name, t.ms);
    }

    fs::create_dir_all(&args.out_dir)?;

    if let Some(terrain) = generator.terrain() {
        info!(
            "backend={} seed={} min={:.3} max={:.3}",
            generator.last_backend().map(|b| b.as_str()).unwrap_or("-"),
            generator.last_seed().unwrap_or_default(),
            terrain.min(),
            terrain.max()
        );
        let path = args.out_dir.join("heightmap.png");
        render::save_png(&path, &render::render_heightmap(terrain), terrain.w, terrain.h)?;
        info!("Saved {}", path.display());
    }

    let path = args.out_dir.join("heightmap.json");
    fs::write(&path, serde_json::to_vec(&generator.heightmap_payload())?)?;
    info!("Saved {}", path.display());

    Ok(())
}
