//! Error types for the delve world generator

use thiserror::Error;

/// Main error type for world generation, meshing and persistence
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
