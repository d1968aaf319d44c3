//! Error types for model training and inference.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while training, saving or applying a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A feature column the model needs is absent
    #[error("Missing feature column: {0}")]
    MissingColumn(String),

    /// Not enough usable rows or periods to train
    #[error("Insufficient data for {label}: need at least {required}, got {actual}")]
    InsufficientData {
        /// Model label
        label: String,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Feature matrix and target vector disagree in length
    #[error("Length mismatch: {rows} feature rows but {targets} targets")]
    LengthMismatch {
        /// Feature rows
        rows: usize,
        /// Target values
        targets: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model has not been fitted
    #[error("Model not fitted")]
    NotFitted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
