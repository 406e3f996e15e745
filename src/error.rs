// src/error.rs
use cardsheet_layout::ConfigError;
use thiserror::Error;

/// A comprehensive error type for the sheet pipeline.
///
/// Per-card problems never show up here; they become failure markers on the
/// sheet. What remains is configuration and output I/O.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<url::ParseError> for PipelineError {
    fn from(e: url::ParseError) -> Self {
        PipelineError::Config(format!("invalid proxy URL: {e}"))
    }
}
