//! Constrained Predictor
//!
//! Raw model output is bounded to
//!
//! [min_value, max_observed × max_multiplier]
//!
//! where max_observed is the largest historical quantity of the slice being
//! scored. Non-finite raw outputs collapse to `min_value`.

use crate::artifact::TrainedModel;
use crate::boosting::Regressor;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Ceiling reference used when the scored table has no reference column.
pub const FALLBACK_MAX_OBSERVED: f64 = 1000.0;

/// Output bounds of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConstraints {
    /// Floor of every prediction
    pub min_value: f64,
    /// Ceiling multiplier on the largest observed quantity, `None` for no ceiling
    pub max_multiplier: Option<f64>,
    /// Column of the scored table holding observed quantities
    pub reference_column: String,
}

impl Default for PredictionConstraints {
    fn default() -> Self {
        Self {
            min_value: 0.0,
            max_multiplier: Some(3.0),
            reference_column: "qty_net".to_string(),
        }
    }
}

impl PredictionConstraints {
    /// Upper bound for a slice whose largest observed quantity is `max_observed`.
    pub fn ceiling(&self, max_observed: f64) -> Option<f64> {
        self.max_multiplier
            .map(|m| (max_observed * m).max(self.min_value))
    }

    /// Bound one raw prediction.
    pub fn clamp(&self, raw: f64, max_observed: f64) -> f64 {
        if !raw.is_finite() {
            return self.min_value;
        }
        let floored = raw.max(self.min_value);
        match self.ceiling(max_observed) {
            Some(ceiling) => floored.min(ceiling),
            None => floored,
        }
    }

    /// Largest value of the reference column in `df`, or the fallback.
    pub fn max_observed(&self, df: &DataFrame) -> Result<f64> {
        let Ok(column) = df.column(&self.reference_column) else {
            return Ok(FALLBACK_MAX_OBSERVED);
        };
        let values = column.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
            .unwrap_or(FALLBACK_MAX_OBSERVED))
    }
}

/// Raw model output for every row of `df`.
pub fn predict_raw(model: &TrainedModel, df: &DataFrame) -> Result<Vec<f64>> {
    let features = model.encoder.transform(df)?;
    model.model.predict(&features)
}

/// Predict every row of `df` and apply the model's constraints, taking the
/// ceiling reference from `df` itself.
pub fn predict_with_constraints(model: &TrainedModel, df: &DataFrame) -> Result<Vec<f64>> {
    let constraints = &model.descriptor.prediction_constraints;
    let max_observed = constraints.max_observed(df)?;
    predict_with_ceiling(model, df, max_observed)
}

/// Predict every row of `df` with a caller-supplied ceiling reference.
pub fn predict_with_ceiling(
    model: &TrainedModel,
    df: &DataFrame,
    max_observed: f64,
) -> Result<Vec<f64>> {
    let constraints = &model.descriptor.prediction_constraints;
    Ok(predict_raw(model, df)?
        .into_iter()
        .map(|raw| constraints.clamp(raw, max_observed))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp() {
        let c = PredictionConstraints::default();
        assert_relative_eq!(c.clamp(-4.0, 10.0), 0.0);
        assert_relative_eq!(c.clamp(12.5, 10.0), 12.5);
        assert_relative_eq!(c.clamp(500.0, 10.0), 30.0);
        assert_relative_eq!(c.clamp(f64::NAN, 10.0), 0.0);
        assert_relative_eq!(c.clamp(f64::INFINITY, 10.0), 0.0);

        let unbounded = PredictionConstraints {
            max_multiplier: None,
            ..PredictionConstraints::default()
        };
        assert_relative_eq!(unbounded.clamp(500.0, 10.0), 500.0);
    }

    #[test]
    fn test_max_observed() {
        let c = PredictionConstraints::default();
        let df = DataFrame::new(vec![Column::new(
            "qty_net".into(),
            vec![Some(3.0), None, Some(7.0)],
        )])
        .unwrap();
        assert_relative_eq!(c.max_observed(&df).unwrap(), 7.0);

        let other = DataFrame::new(vec![Column::new("x".into(), vec![1.0])]).unwrap();
        assert_relative_eq!(c.max_observed(&other).unwrap(), FALLBACK_MAX_OBSERVED);
    }
}
