//! Error types for panel and feature construction.

use atelier_data::DataError;
use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building the monthly panel.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The transaction table is unusable
    #[error(transparent)]
    Data(#[from] DataError),

    /// Forecast horizon outside the supported range
    #[error("Invalid horizon {horizon}: must be between 0 and {max} months")]
    InvalidHorizon {
        /// Requested horizon
        horizon: u32,
        /// Largest supported horizon
        max: u32,
    },

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
