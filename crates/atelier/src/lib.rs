#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/atelier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod forecast;
pub mod memo;
pub mod pipeline;

// Re-export main types from sub-crates
pub use atelier_data as data;
pub use atelier_features as features;
pub use atelier_model as model;
pub use atelier_output as output;

pub use config::{DEFAULT_HORIZON, PipelineConfig, TargetSpec};
pub use error::{PipelineError, Result};
pub use forecast::{CeilingSource, ForecastPoint, Forecaster};
pub use memo::{MemoizedPipeline, cache_key};
pub use pipeline::{ModelSet, PreparedData, TrainingReport, build_panel_and_train, train_targets};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
