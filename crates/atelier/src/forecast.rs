//! Recursive multi-month forecasting.
//!
//! Future months are filled in order. After each month the panel's lag,
//! rolling and seasonality features are recomputed, so month `t + 2` sees
//! the prediction for `t + 1` in its lag-1 column.

use crate::error::Result;
use crate::pipeline::ModelSet;
use atelier_features::frame::rows_to_dataframe;
use atelier_features::{EntityKey, Month, MonthlyPanel, Target};
use atelier_model::predictor::predict_raw;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Where the prediction ceiling comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CeilingSource {
    /// Largest historical demand of the same entity and target
    #[default]
    Entity,
    /// Reference column of the scored month, as in single-table scoring
    Frame,
}

/// One predicted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Store, family and size
    pub entity: EntityKey,
    /// Forecast month
    pub month: Month,
    /// Demand measure
    pub target: Target,
    /// Constrained prediction
    pub value: f64,
}

/// Fills the future rows of a panel with constrained predictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forecaster {
    ceiling: CeilingSource,
}

impl Forecaster {
    /// Create a forecaster.
    pub const fn new(ceiling: CeilingSource) -> Self {
        Self { ceiling }
    }

    /// Ceiling source in use.
    pub const fn ceiling(&self) -> CeilingSource {
        self.ceiling
    }

    /// Predict every future month of `panel` with the models in `models`.
    ///
    /// Predictions are written onto the panel rows and also returned in
    /// month, target, entity order. Targets without a model stay empty.
    pub fn forecast(&self, panel: &mut MonthlyPanel, models: &ModelSet) -> Result<Vec<ForecastPoint>> {
        let months = panel.future_months();
        if months.is_empty() || models.is_empty() {
            return Ok(Vec::new());
        }

        let ceilings = entity_ceilings(panel);
        let mut points = Vec::new();

        for month in months {
            let (entities, frame) = {
                let rows: Vec<_> = panel.future_rows().filter(|r| r.month == month).collect();
                let entities: Vec<EntityKey> = rows.iter().map(|r| r.entity.clone()).collect();
                (entities, rows_to_dataframe(rows, panel.lag_spec())?)
            };

            for (target, model) in models.iter() {
                let constraints = &model.descriptor.prediction_constraints;
                let frame_ceiling = match self.ceiling {
                    CeilingSource::Frame => Some(constraints.max_observed(&frame)?),
                    CeilingSource::Entity => None,
                };

                for (entity, raw) in entities.iter().zip(predict_raw(model, &frame)?) {
                    let max_observed = frame_ceiling.unwrap_or_else(|| {
                        ceilings
                            .get(&target)
                            .and_then(|by_entity| by_entity.get(entity))
                            .copied()
                            .unwrap_or(0.0)
                    });
                    let value = constraints.clamp(raw, max_observed);
                    panel.set_prediction(entity, month, target, value);
                    points.push(ForecastPoint {
                        entity: entity.clone(),
                        month,
                        target,
                        value,
                    });
                }
            }

            panel.refresh_features();
            debug!(month = %month, entities = entities.len(), "Forecast month");
        }

        info!(
            months = panel.horizon(),
            predictions = points.len(),
            "Forecast complete"
        );
        Ok(points)
    }
}

/// Largest historical demand per target and entity.
fn entity_ceilings(panel: &MonthlyPanel) -> HashMap<Target, HashMap<EntityKey, f64>> {
    let mut ceilings: HashMap<Target, HashMap<EntityKey, f64>> = HashMap::new();
    for series in panel.series() {
        let entity = &series[0].entity;
        for target in Target::all() {
            let max = series
                .iter()
                .filter(|r| !r.is_future)
                .filter_map(|r| r.actual(target))
                .fold(0.0, f64::max);
            ceilings
                .entry(target)
                .or_default()
                .insert(entity.clone(), max);
        }
    }
    ceilings
}
