//! Lag and rolling-window features
//!
//! For a row at series position `i`:
//! - lag_N = value at position `i - N` (none when `i < N`)
//! - rolling_W = mean of the values at positions `i - W .. i` (current row excluded)
//!
//! Only strictly earlier positions of the same entity series are read, so a
//! row's features never see its own month or anything after it.
//!
//! Values are the actual demand for historical months. Future months use their
//! prediction when one has been written, otherwise the most recent earlier
//! value is carried forward.

use crate::error::{FeatureError, Result};
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Lag depths and rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagSpec {
    /// Lag depths in months (default 1, 3, 12)
    pub lags: Vec<usize>,
    /// Rolling window in months (default 6)
    pub rolling_window: usize,
}

impl Default for LagSpec {
    fn default() -> Self {
        Self {
            lags: vec![1, 3, 12],
            rolling_window: 6,
        }
    }
}

impl LagSpec {
    /// Check that lags and window are positive.
    pub fn validate(&self) -> Result<()> {
        if self.lags.is_empty() || self.lags.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "lag depths must be non-empty and positive".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(FeatureError::InvalidConfig(
                "rolling window must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Feature column names for `target`, lags first then the rolling mean.
    pub fn columns(&self, target: Target) -> Vec<String> {
        self.lags
            .iter()
            .map(|&lag| target.lag_column(lag))
            .chain(std::iter::once(target.rolling_column(self.rolling_window)))
            .collect()
    }
}

/// History features of one target on one row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetHistory {
    /// Lag values aligned with [`LagSpec::lags`]
    pub lags: Vec<Option<f64>>,
    /// Trailing mean
    pub rolling: Option<f64>,
}

impl TargetHistory {
    /// Value of lag `lag` under `spec`.
    pub fn lag(&self, spec: &LagSpec, lag: usize) -> Option<f64> {
        spec.lags
            .iter()
            .position(|&l| l == lag)
            .and_then(|i| self.lags.get(i).copied().flatten())
    }
}

/// Resolve the value series: known values stay, gaps carry the latest
/// earlier value forward.
fn carry_forward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Compute history features for one entity series ordered by month.
///
/// `values[i]` is the known demand at position `i`: the actual for
/// historical months, the prediction (if any) for future months.
pub fn series_history(values: &[Option<f64>], spec: &LagSpec) -> Vec<TargetHistory> {
    let resolved = carry_forward(values);
    let window = spec.rolling_window;

    (0..resolved.len())
        .map(|i| {
            let lags = spec
                .lags
                .iter()
                .map(|&lag| if i >= lag { resolved[i - lag] } else { None })
                .collect();

            let earlier = &resolved[i.saturating_sub(window)..i];
            let known: Vec<f64> = earlier.iter().flatten().copied().collect();
            let rolling = if known.is_empty() {
                None
            } else {
                Some(known.iter().sum::<f64>() / known.len() as f64)
            };

            TargetHistory { lags, rolling }
        })
        .collect()
}
