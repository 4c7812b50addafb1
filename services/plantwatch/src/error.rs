//! Error types for the plantwatch service

use crate::timestamp::TimestampError;

/// Errors that can occur in the plantwatch service
#[derive(Debug, thiserror::Error)]
pub enum PlantwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Weather error: {0}")]
    Weather(String),

    #[error("IoT error: {0}")]
    Iot(String),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampError),
}

/// Result type alias for plantwatch operations
pub type Result<T> = std::result::Result<T, PlantwatchError>;
