use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use topogen::rng::coerce_seed;
use topogen::{GenerationParameters, HeightmapPayload, PipelineConfig, TerrainGenerator, render};

#[derive(Deserialize)]
struct GenerateRequest {
    width: Option<usize>,
    height: Option<usize>,
    terrain_roughness: Option<i32>,
    height_variation: Option<f32>,
    /// Any JSON value; non-numeric seeds fall back to SEED_MIN.
    seed: Option<Value>,
    // Craters
    crater_enabled: Option<bool>,
    num_craters: Option<u32>,
    crater_size: Option<f32>,
    crater_depth: Option<f32>,
    base_height: Option<f32>,
}

#[derive(Serialize)]
struct GenerateResponse {
    heightmap: HeightmapPayload,
    preview: String,
    backend: String,
    seed: u32,
    timings: Vec<TimingEntry>,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, err: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    let msg = err.to_string();
    error!("{msg}");
    (status, Json(ErrorResponse { error: msg }))
}

fn data_url(png: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png);
    format!("data:image/png;base64,{}", b64)
}

fn run(req: GenerateRequest, config: PipelineConfig) -> topogen::Result<GenerateResponse> {
    let defaults = GenerationParameters::default();
    let width = req.width.unwrap_or(160);
    let height = req.height.unwrap_or(90);

    // Loosely typed seeds are coerced here; range folding happens in the pipeline.
    let seed = match &req.seed {
        None => defaults.seed,
        Some(v) => coerce_seed(v).unwrap_or(config.seed_min as i64),
    };

    let params = GenerationParameters {
        terrain_roughness: req.terrain_roughness.unwrap_or(defaults.terrain_roughness),
        height_variation: req.height_variation.unwrap_or(defaults.height_variation),
        seed,
        crater_enabled: req.crater_enabled.unwrap_or(defaults.crater_enabled),
        num_craters: req.num_craters.unwrap_or(defaults.num_craters),
        crater_size: req.crater_size.unwrap_or(defaults.crater_size),
        crater_depth: req.crater_depth.unwrap_or(defaults.crater_depth),
        base_height: req.base_height.unwrap_or(defaults.base_height),
    };

    // One generator per request: never two generations on the same instance.
    let mut generator = TerrainGenerator::new(width, height, config)?;
    let timings = generator.generate(&params);

    let preview = match generator.terrain() {
        Some(t) => data_url(&render::encode_png(&render::render_heightmap(t), t.w, t.h)?),
        None => String::new(),
    };

    Ok(GenerateResponse {
        heightmap: generator.heightmap_payload(),
        preview,
        backend: generator
            .last_backend()
            .map(|b| b.to_string())
            .unwrap_or_default(),
        seed: generator.last_seed().unwrap_or_default(),
        timings: timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect(),
    })
}

async fn generate_handler(
    State(config): State<PipelineConfig>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let response = tokio::task::spawn_blocking(move || run(req, config))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| {
            let status = if matches!(e, topogen::Error::InvalidDimensions { .. }) {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            api_error(status, e)
        })?;

    Ok(Json(response))
}

#[tokio::main]
async fn main() -> topogen::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_env()?;
    info!("pipeline config: {:?}", config);

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .layer(CorsLayer::permissive())
        .with_state(config)
        .fallback_service(frontend);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("topogen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
