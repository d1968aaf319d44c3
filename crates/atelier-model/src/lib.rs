#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/atelier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod boosting;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod predictor;
pub mod split;
pub mod trainer;
pub mod tree;

pub use artifact::{ArtifactStore, ModelDescriptor, TrainedModel, ValidationMetrics};
pub use boosting::{BoosterParams, GradientBoostedTrees, Regressor};
pub use dataset::{ColumnKind, Dataset, FeatureEncoder, FeatureSchema};
pub use error::{ModelError, Result};
pub use predictor::{PredictionConstraints, predict_with_ceiling, predict_with_constraints};
pub use split::{Fold, TimeSeriesSplit};
pub use trainer::{CandidateConfig, TrainerConfig, train_robust_model};
pub use tree::{RegressionTree, TreeParams};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
