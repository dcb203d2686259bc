//! Error types for the diagnostic modelling pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DxError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum DxError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Non-finite value in feature '{column}' at row {row}")]
    NonFiniteFeature { column: String, row: usize },

    #[error("Degenerate class distribution: {0}")]
    DegenerateClasses(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Positive label '{label}' matches no record")]
    UnknownPositiveLabel { label: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for DxError {
    fn from(err: polars::error::PolarsError) -> Self {
        DxError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DxError {
    fn from(err: serde_json::Error) -> Self {
        DxError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DxError {
    fn from(err: ndarray::ShapeError) -> Self {
        DxError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
