//! Pipeline configuration and per-target model specifications.

use crate::error::Result;
use atelier_features::registry::{base_features, history_features, season_feature};
use atelier_features::{LagSpec, Month, PanelConfig, Target};
use atelier_model::TrainerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of future months to forecast.
pub const DEFAULT_HORIZON: u32 = 3;

/// Configuration of a full pipeline run.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Panel construction
    pub panel: PanelConfig,
    /// Model training
    pub trainer: TrainerConfig,
    /// Last month allowed in the training tables, `None` for all history
    pub training_cutoff: Option<Month>,
}

impl PipelineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Model specification of each target.
    pub fn target_specs(&self) -> [TargetSpec; 2] {
        [
            TargetSpec::in_season(&self.panel.lag_spec),
            TargetSpec::out_of_season(&self.panel.lag_spec),
        ]
    }
}

/// Feature list and categorical subset used to model one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Target being modelled
    pub target: Target,
    /// Feature columns in model order
    pub features: Vec<String>,
    /// Categorical subset of `features`
    pub categorical: Vec<String>,
}

impl TargetSpec {
    /// Shared features plus the in-season lags.
    pub fn in_season(spec: &LagSpec) -> Self {
        let mut features = base_features();
        features.extend(history_features(Target::InSeason, spec));
        Self::from_features(Target::InSeason, features)
    }

    /// Shared features, the campaign season and the out-of-season lags.
    ///
    /// Clearance demand depends on which campaign is being cleared, so the
    /// season enters this model only.
    pub fn out_of_season(spec: &LagSpec) -> Self {
        let mut features = base_features();
        features.push(season_feature());
        features.extend(history_features(Target::OutOfSeason, spec));
        Self::from_features(Target::OutOfSeason, features)
    }

    /// Specification for `target`.
    pub fn for_target(target: Target, spec: &LagSpec) -> Self {
        match target {
            Target::InSeason => Self::in_season(spec),
            Target::OutOfSeason => Self::out_of_season(spec),
        }
    }

    fn from_features(target: Target, features: Vec<atelier_features::FeatureInfo>) -> Self {
        let categorical = features
            .iter()
            .filter(|f| f.is_categorical())
            .map(|f| f.name.clone())
            .collect();
        Self {
            target,
            features: features.into_iter().map(|f| f.name).collect(),
            categorical,
        }
    }

    /// Model label, e.g. `IN SEASON`.
    pub const fn label(&self) -> &'static str {
        self.target.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = PipelineConfig::from_json_str(
            r#"{"training_cutoff": "2025-06", "trainer": {"min_rows": 50, "drop_zero_targets": false}}"#,
        )
        .unwrap();
        assert_eq!(config.training_cutoff, Month::new(2025, 6));
        assert_eq!(config.trainer.min_rows, 50);
        assert!(!config.trainer.drop_zero_targets);
        assert_eq!(config.trainer.candidates.len(), 3);

        assert!(PipelineConfig::from_json_str(r#"{"training_cutoff": "June"}"#).is_err());
    }

    #[test]
    fn test_target_specs() {
        let spec = LagSpec::default();
        let in_season = TargetSpec::in_season(&spec);
        let out_of_season = TargetSpec::out_of_season(&spec);

        assert_eq!(in_season.features.len(), 15 + 4);
        assert_eq!(out_of_season.features.len(), 15 + 1 + 4);
        assert!(in_season.features.contains(&"lag_12_qty_in_season".to_string()));
        assert!(!in_season.features.iter().any(|f| f.contains("out_of_season")));
        assert!(!in_season.categorical.contains(&"season".to_string()));
        assert!(out_of_season.categorical.contains(&"season".to_string()));
        assert_eq!(
            in_season.categorical,
            vec!["quarter", "store", "family", "size"]
        );
        for spec in [&in_season, &out_of_season] {
            assert!(spec.categorical.iter().all(|c| spec.features.contains(c)));
        }
        assert_eq!(out_of_season.label(), "OUT OF SEASON");
    }
}
