#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/atelier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod lags;
pub mod margin;
pub mod month;
pub mod panel;
pub mod registry;
pub mod season;
pub mod seasonality;
pub mod target;
pub mod temporal;

pub use error::{FeatureError, Result};
pub use lags::{LagSpec, TargetHistory};
pub use margin::{MarginFeatures, MarkdownCalendar};
pub use month::Month;
pub use panel::{EntityKey, MAX_HORIZON, MonthlyPanel, PanelBuilder, PanelConfig, PanelRow};
pub use registry::{FeatureCategory, FeatureInfo, FeatureKind};
pub use season::{SeasonCalendar, SeasonClassification, SeasonType, SeasonWindow, classify};
pub use seasonality::SeasonalityIndex;
pub use target::Target;
pub use temporal::CalendarFeatures;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
