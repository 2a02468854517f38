//! Error types for the nephroml pipeline

use thiserror::Error;

/// Result type alias for nephroml operations
pub type Result<T> = std::result::Result<T, NephroError>;

/// Main error type for the nephroml crate
#[derive(Error, Debug)]
pub enum NephroError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),

    #[error("Invalid search space: {0}")]
    InvalidSearchSpace(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Checkpoint write failed for {path}: {source}")]
    CheckpointWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for NephroError {
    fn from(err: serde_json::Error) -> Self {
        NephroError::SerializationError(err.to_string())
    }
}

impl From<polars::error::PolarsError> for NephroError {
    fn from(err: polars::error::PolarsError) -> Self {
        NephroError::DataError(err.to_string())
    }
}
