use thiserror::Error;

/// Errors surfaced by the terrain pipeline and its binaries.
///
/// The pipeline itself clamps bad numeric input instead of failing; only
/// structurally impossible requests end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid grid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    #[error("unknown noise backend '{0}' (expected 'perlin' or 'fbm')")]
    UnknownBackend(String),

    #[error("invalid heightmap: {0}")]
    InvalidHeightmap(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
