//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading transactions.
///
/// Every variant except [`DataError::Io`] and [`DataError::Csv`] is a data
/// format error: the input does not honour the column contract.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column is absent
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// Name of the missing column
        column: String,
    },

    /// A document date could not be parsed
    #[error("Unparseable date at row {row}: {value:?}")]
    UnparseableDate {
        /// Zero-based row index
        row: usize,
        /// Raw value found in the input
        value: String,
    },

    /// A numeric field holds a non-numeric value
    #[error("Invalid number in column {column} at row {row}: {value:?}")]
    InvalidNumber {
        /// Column name
        column: String,
        /// Zero-based row index
        row: usize,
        /// Raw value found in the input
        value: String,
    },

    /// A column has a dtype that cannot be coerced
    #[error("Unsupported type for column {column}: {dtype}")]
    UnsupportedType {
        /// Column name
        column: String,
        /// Polars dtype, rendered
        dtype: String,
    },

    /// The table holds no transactions
    #[error("Transaction table is empty")]
    Empty,

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a [`DataError::MissingColumn`].
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Whether this error is a data format problem rather than an IO failure.
    pub const fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Csv(_))
    }
}
