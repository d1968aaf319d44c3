//! Time-ordered cross-validation
//!
//! Folds are built over distinct calendar periods rather than rows. With P
//! sorted periods and k splits, each validation block spans P / (k + 1)
//! periods and fold i trains on every period before its block:
//!
//! ```text
//! fold 1: [train ][val]
//! fold 2: [train      ][val]
//! fold 3: [train           ][val]
//! ```
//!
//! Every training period is strictly earlier than every validation period.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Expanding-window splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesSplit {
    /// Number of folds
    pub n_splits: usize,
    /// Minimum training periods of the first fold
    pub min_train_periods: usize,
}

impl Default for TimeSeriesSplit {
    fn default() -> Self {
        Self {
            n_splits: 3,
            min_train_periods: 1,
        }
    }
}

/// Row indices of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Training rows
    pub train: Vec<usize>,
    /// Validation rows
    pub validation: Vec<usize>,
}

impl TimeSeriesSplit {
    /// Create a splitter with `n_splits` folds.
    pub const fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            min_train_periods: 1,
        }
    }

    /// Smallest number of distinct periods this splitter accepts.
    pub fn required_periods(&self) -> usize {
        let n = self.n_splits;
        let min_train = self.min_train_periods.max(1);
        (n + 1..)
            .find(|p| p - n * (p / (n + 1)) >= min_train)
            .unwrap_or(usize::MAX)
    }

    fn first_train_periods(&self, periods: usize) -> usize {
        periods.saturating_sub(self.n_splits * (periods / (self.n_splits + 1)))
    }

    /// Split rows by their period index.
    pub fn split(&self, label: &str, periods: &[i32]) -> Result<Vec<Fold>> {
        if self.n_splits == 0 {
            return Err(ModelError::InvalidParameter(
                "n_splits must be positive".to_string(),
            ));
        }

        let distinct: Vec<i32> = periods
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let p = distinct.len();
        let block = p / (self.n_splits + 1);
        let first_train = self.first_train_periods(p);

        if block == 0 || first_train < self.min_train_periods.max(1) {
            return Err(ModelError::InsufficientData {
                label: label.to_string(),
                required: self.required_periods(),
                actual: p,
            });
        }

        let folds = (0..self.n_splits)
            .map(|i| {
                let train_end = first_train + i * block;
                let cutoff = distinct[train_end];
                let val_end = distinct.get(train_end + block).copied();

                let mut fold = Fold {
                    train: Vec::new(),
                    validation: Vec::new(),
                };
                for (row, &period) in periods.iter().enumerate() {
                    if period < cutoff {
                        fold.train.push(row);
                    } else if val_end.is_none_or(|end| period < end) {
                        fold.validation.push(row);
                    }
                }
                fold
            })
            .collect();
        Ok(folds)
    }
}
