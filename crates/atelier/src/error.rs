//! Error types for the end-to-end pipeline.

use atelier_data::DataError;
use atelier_features::FeatureError;
use atelier_model::ModelError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while preparing, training or forecasting.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transaction table error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Panel or feature error
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Training or inference error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
