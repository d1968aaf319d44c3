//! Demand targets of the panel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two demand measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Units sold inside their campaign window
    InSeason,
    /// Units sold outside their campaign window
    OutOfSeason,
}

impl Target {
    /// Both targets.
    pub const fn all() -> [Self; 2] {
        [Self::InSeason, Self::OutOfSeason]
    }

    /// Column holding the actual demand.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::InSeason => "qty_in_season",
            Self::OutOfSeason => "qty_out_of_season",
        }
    }

    /// Column holding the predicted demand.
    pub const fn prediction_column(&self) -> &'static str {
        match self {
            Self::InSeason => "pred_qty_in_season",
            Self::OutOfSeason => "pred_qty_out_of_season",
        }
    }

    /// Human-readable label used in logs and reports.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InSeason => "IN SEASON",
            Self::OutOfSeason => "OUT OF SEASON",
        }
    }

    /// Short machine name, used for artifact file names.
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::InSeason => "in_season",
            Self::OutOfSeason => "out_of_season",
        }
    }

    /// Lag feature column name.
    pub fn lag_column(&self, lag: usize) -> String {
        format!("lag_{lag}_{}", self.column())
    }

    /// Rolling-mean feature column name.
    pub fn rolling_column(&self, window: usize) -> String {
        format!("rolling_{window}m_{}", self.column())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
