use thiserror::Error;

/// Errors raised at the crate boundary while loading configuration or task
/// files. Layout and routing themselves never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Json5(#[from] json5::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
