//! Model Trainer
//!
//! Selects a boosting configuration by time-series cross-validation and
//! refits it on every usable row.
//!
//! Rows without a target are dropped. Rows with a zero target are dropped as
//! well unless `drop_zero_targets` is off: the models size actual demand, and
//! the many zero cells of a gap-filled panel would otherwise dominate the fit.

use crate::artifact::{ModelDescriptor, TrainedModel, ValidationMetrics};
use crate::boosting::{BoosterParams, GradientBoostedTrees, Regressor};
use crate::dataset::{Dataset, FeatureEncoder, FeatureSchema};
use crate::error::{ModelError, Result};
use crate::metrics::{mae, r2_score, rmse};
use crate::predictor::PredictionConstraints;
use crate::split::TimeSeriesSplit;
use crate::tree::TreeParams;
use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A named boosting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Configuration name
    pub name: String,
    /// Boosting parameters
    pub params: BoosterParams,
}

impl CandidateConfig {
    /// Few, heavily regularised trees.
    pub fn conservative() -> Self {
        Self {
            name: "conservative".to_string(),
            params: BoosterParams {
                n_estimators: 150,
                learning_rate: 0.03,
                tree: TreeParams {
                    max_depth: 4,
                    min_samples_leaf: 20,
                    l2_regularization: 10.0,
                },
                subsample: 0.8,
                seed: 42,
            },
        }
    }

    /// Stumps-to-depth-3 trees.
    pub fn shallow() -> Self {
        Self {
            name: "shallow".to_string(),
            params: BoosterParams {
                n_estimators: 200,
                learning_rate: 0.05,
                tree: TreeParams {
                    max_depth: 3,
                    min_samples_leaf: 10,
                    l2_regularization: 5.0,
                },
                subsample: 0.8,
                seed: 42,
            },
        }
    }

    /// Middle ground between depth and regularisation.
    pub fn balanced() -> Self {
        Self {
            name: "balanced".to_string(),
            params: BoosterParams {
                n_estimators: 250,
                learning_rate: 0.05,
                tree: TreeParams {
                    max_depth: 5,
                    min_samples_leaf: 10,
                    l2_regularization: 3.0,
                },
                subsample: 0.8,
                seed: 42,
            },
        }
    }
}

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Minimum usable rows; fewer skips the model
    pub min_rows: usize,
    /// Drop rows whose target is exactly zero
    pub drop_zero_targets: bool,
    /// Overfitting score above which a model is flagged
    pub overfitting_threshold: f64,
    /// Cross-validation scheme
    pub split: TimeSeriesSplit,
    /// Configurations to compare
    pub candidates: Vec<CandidateConfig>,
    /// Bounds stored with the model
    pub constraints: PredictionConstraints,
    /// Column holding the calendar year
    pub year_column: String,
    /// Column holding the month of year
    pub month_column: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_rows: 30,
            drop_zero_targets: true,
            overfitting_threshold: 0.1,
            split: TimeSeriesSplit::default(),
            candidates: vec![
                CandidateConfig::conservative(),
                CandidateConfig::shallow(),
                CandidateConfig::balanced(),
            ],
            constraints: PredictionConstraints::default(),
            year_column: "year".to_string(),
            month_column: "month".to_string(),
        }
    }
}

/// Period index per row from the year and month columns.
fn periods(df: &DataFrame, config: &TrainerConfig) -> Result<Vec<Option<i32>>> {
    let numeric = |name: &str| -> Result<Vec<Option<i32>>> {
        let column = df
            .column(name)
            .map_err(|_| ModelError::MissingColumn(name.to_string()))?;
        let values = column.cast(&DataType::Int32)?;
        Ok(values.i32()?.into_iter().collect())
    };
    let years = numeric(&config.year_column)?;
    let months = numeric(&config.month_column)?;
    Ok(years
        .into_iter()
        .zip(months)
        .map(|(y, m)| Some(y? * 12 + m? - 1))
        .collect())
}

/// Mean validation R² of `params` over the folds.
fn cross_validate(
    data: &Dataset,
    params: BoosterParams,
    split: &TimeSeriesSplit,
    label: &str,
) -> Result<Vec<f64>> {
    let mut scores = Vec::new();
    for (i, fold) in split.split(label, &data.periods)?.into_iter().enumerate() {
        let train = data.select(&fold.train);
        let validation = data.select(&fold.validation);

        let mut model = GradientBoostedTrees::new(params);
        model.fit(&train)?;
        let predicted = model.predict(&validation.features)?;
        let score = r2_score(&validation.targets, &predicted);
        debug!(
            label,
            fold = i + 1,
            train_rows = train.len(),
            validation_rows = validation.len(),
            r2 = score,
            "Validated fold"
        );
        scores.push(score);
    }
    Ok(scores)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Train a model for one target.
///
/// # Arguments
/// * `x` - Feature table; its columns are the model features in order, plus
///   the year and month columns when those are not features themselves
/// * `features` - Feature columns to use
/// * `y` - Target per row of `x` (`None` rows are dropped)
/// * `categorical` - Subset of `features` read as categories
/// * `label` - Name used in logs and in the descriptor
/// * `target` - Target column name stored in the descriptor
///
/// # Returns
/// `Ok(None)` when too few rows or periods remain, after logging a warning.
/// Structural problems (missing columns, length mismatch) are errors.
pub fn train_robust_model(
    x: &DataFrame,
    features: &[String],
    y: &[Option<f64>],
    categorical: &[String],
    label: &str,
    target: &str,
    config: &TrainerConfig,
) -> Result<Option<TrainedModel>> {
    if x.height() != y.len() {
        return Err(ModelError::LengthMismatch {
            rows: x.height(),
            targets: y.len(),
        });
    }
    if config.candidates.is_empty() {
        return Err(ModelError::InvalidParameter(
            "at least one candidate configuration is required".to_string(),
        ));
    }

    let schema = FeatureSchema::new(features, categorical)?;
    let row_periods = periods(x, config)?;

    let keep: Vec<usize> = y
        .iter()
        .zip(&row_periods)
        .enumerate()
        .filter(|(_, (value, period))| {
            period.is_some()
                && value.is_some_and(|t| {
                    t.is_finite() && !(config.drop_zero_targets && t == 0.0)
                })
        })
        .map(|(i, _)| i)
        .collect();

    info!(label, rows = x.height(), usable = keep.len(), "Preparing training data");
    if keep.len() < config.min_rows {
        warn!(
            label,
            required = config.min_rows,
            actual = keep.len(),
            "Insufficient data, skipping model"
        );
        return Ok(None);
    }

    let idx = IdxCa::from_vec("idx".into(), keep.iter().map(|&i| i as IdxSize).collect());
    let table = x.take(&idx)?;
    let encoder = FeatureEncoder::fit(schema, &table)?;
    let data = Dataset::new(
        encoder.transform(&table)?,
        keep.iter().filter_map(|&i| y[i]).collect(),
        keep.iter().filter_map(|&i| row_periods[i]).collect(),
        encoder.schema().kinds().to_vec(),
    )?;

    let mut best: Option<(&CandidateConfig, Vec<f64>)> = None;
    for candidate in &config.candidates {
        let scores = match cross_validate(&data, candidate.params, &config.split, label) {
            Ok(scores) => scores,
            Err(ModelError::InsufficientData {
                required, actual, ..
            }) => {
                warn!(label, required, actual, "Too few periods for validation, skipping model");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let cv = mean(&scores);
        info!(label, candidate = %candidate.name, cv_r2 = cv, "Scored candidate");
        if best.as_ref().is_none_or(|(_, s)| cv > mean(s)) {
            best = Some((candidate, scores));
        }
    }
    let Some((chosen, fold_scores)) = best else {
        return Ok(None);
    };

    let mut model = GradientBoostedTrees::new(chosen.params);
    model.fit(&data)?;
    let fitted = model.predict(&data.features)?;

    let r2 = r2_score(&data.targets, &fitted);
    let cv_r2 = mean(&fold_scores);
    let overfitting_score = r2 - cv_r2;
    let is_overfitting = overfitting_score > config.overfitting_threshold;
    let validation = ValidationMetrics {
        r2,
        cv_r2,
        cv_fold_r2: fold_scores,
        rmse: rmse(&data.targets, &fitted),
        mae: mae(&data.targets, &fitted),
        overfitting_score,
        is_overfitting,
        n_samples: data.len(),
    };

    if is_overfitting {
        warn!(
            label,
            overfitting_score,
            threshold = config.overfitting_threshold,
            "Potential overfitting detected"
        );
    }
    info!(
        label,
        model = %chosen.name,
        r2,
        cv_r2,
        rmse = validation.rmse,
        "Trained model"
    );

    let descriptor = ModelDescriptor {
        label: label.to_string(),
        target: target.to_string(),
        model_name: format!("{}_{}", model.name(), chosen.name),
        features: encoder.schema().names().to_vec(),
        categorical_features: encoder.schema().categorical(),
        validation,
        prediction_constraints: config.constraints.clone(),
        trained_at: Utc::now(),
    };

    Ok(Some(TrainedModel {
        model,
        encoder,
        descriptor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TrainerConfig {
        let mut candidate = CandidateConfig::shallow();
        candidate.params.n_estimators = 20;
        TrainerConfig {
            min_rows: 10,
            candidates: vec![candidate],
            ..TrainerConfig::default()
        }
    }

    fn frame(n: usize) -> (DataFrame, Vec<Option<f64>>) {
        let years: Vec<i32> = (0..n).map(|i| 2023 + (i / 12) as i32).collect();
        let months: Vec<i32> = (0..n).map(|i| (i % 12) as i32 + 1).collect();
        let store: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "T01" } else { "T02" }).collect();
        let y = (0..n)
            .map(|i| Some(if i % 2 == 0 { 10.0 } else { 30.0 } + (i % 12) as f64))
            .collect();
        let df = DataFrame::new(vec![
            Column::new("year".into(), years),
            Column::new("month".into(), months),
            Column::new("store".into(), store),
        ])
        .unwrap();
        (df, y)
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_length_mismatch() {
        let (df, y) = frame(12);
        let result = train_robust_model(
            &df,
            &names(&["month"]),
            &y[..5],
            &[],
            "IN SEASON",
            "qty_in_season",
            &small_config(),
        );
        assert!(matches!(result, Err(ModelError::LengthMismatch { .. })));
    }

    #[test]
    fn test_missing_period_columns() {
        let (df, y) = frame(12);
        let df = df.drop("year").unwrap();
        let result = train_robust_model(
            &df,
            &names(&["month"]),
            &y,
            &[],
            "IN SEASON",
            "qty_in_season",
            &small_config(),
        );
        assert!(matches!(result, Err(ModelError::MissingColumn(c)) if c == "year"));
    }

    #[test]
    fn test_too_few_rows_is_skipped() {
        let (df, mut y) = frame(24);
        for v in y.iter_mut().skip(5) {
            *v = Some(0.0);
        }
        let result = train_robust_model(
            &df,
            &names(&["month", "store"]),
            &y,
            &names(&["store"]),
            "OUT OF SEASON",
            "qty_out_of_season",
            &small_config(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_trains_and_describes() {
        let (df, y) = frame(48);
        let model = train_robust_model(
            &df,
            &names(&["month", "store"]),
            &y,
            &names(&["store"]),
            "IN SEASON",
            "qty_in_season",
            &small_config(),
        )
        .unwrap()
        .unwrap();

        let d = &model.descriptor;
        assert_eq!(d.features, vec!["month", "store"]);
        assert_eq!(d.categorical_features, vec!["store"]);
        assert_eq!(d.model_name, "gradient_boosted_trees_shallow");
        assert_eq!(d.validation.n_samples, 48);
        assert_eq!(d.validation.cv_fold_r2.len(), 3);
        assert!(d.validation.r2 > 0.5);
        assert!(
            (d.validation.overfitting_score - (d.validation.r2 - d.validation.cv_r2)).abs() < 1e-12
        );
    }
}
