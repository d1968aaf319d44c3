//! Panel preparation and per-target training.

use crate::config::{PipelineConfig, TargetSpec};
use crate::error::Result;
use atelier_data::TransactionTable;
use atelier_features::frame::rows_to_dataframe;
use atelier_features::{Month, MonthlyPanel, PanelBuilder, Target};
use atelier_model::{ArtifactStore, ModelDescriptor, TrainedModel, train_robust_model};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// The monthly panel plus the training table of each target.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Historical rows with a known in-season value
    pub in_season: DataFrame,
    /// Historical rows with a known out-of-season value
    pub out_of_season: DataFrame,
    /// Full panel, history and future rows
    pub panel: MonthlyPanel,
}

impl PreparedData {
    /// Training table of `target`.
    pub const fn training_frame(&self, target: Target) -> &DataFrame {
        match target {
            Target::InSeason => &self.in_season,
            Target::OutOfSeason => &self.out_of_season,
        }
    }
}

/// Build the monthly panel with `horizon` future months and the training
/// table of each target.
///
/// Training tables hold historical rows only, cut at
/// [`PipelineConfig::training_cutoff`] when one is set.
pub fn build_panel_and_train(
    table: &TransactionTable,
    horizon: u32,
    config: &PipelineConfig,
) -> Result<PreparedData> {
    let panel = PanelBuilder::new(config.panel.clone()).build(table, horizon)?;
    let cutoff = config.training_cutoff;

    let in_season = training_frame(&panel, Target::InSeason, cutoff)?;
    let out_of_season = training_frame(&panel, Target::OutOfSeason, cutoff)?;
    info!(
        panel_rows = panel.len(),
        in_season_rows = in_season.height(),
        out_of_season_rows = out_of_season.height(),
        cutoff = cutoff.map(|m| m.to_string()),
        "Prepared training data"
    );

    Ok(PreparedData {
        in_season,
        out_of_season,
        panel,
    })
}

fn training_frame(panel: &MonthlyPanel, target: Target, cutoff: Option<Month>) -> Result<DataFrame> {
    let rows = panel
        .historical_rows()
        .filter(|r| r.actual(target).is_some())
        .filter(|r| cutoff.is_none_or(|c| r.month <= c));
    Ok(rows_to_dataframe(rows, panel.lag_spec())?)
}

/// Trained models keyed by target.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    models: BTreeMap<Target, TrainedModel>,
}

impl ModelSet {
    /// Empty set.
    pub const fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Add or replace the model of `target`.
    pub fn insert(&mut self, target: Target, model: TrainedModel) -> Option<TrainedModel> {
        self.models.insert(target, model)
    }

    /// Model of `target`, if one was trained.
    pub fn get(&self, target: Target) -> Option<&TrainedModel> {
        self.models.get(&target)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is present.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in target order.
    pub fn iter(&self) -> impl Iterator<Item = (Target, &TrainedModel)> {
        self.models.iter().map(|(t, m)| (*t, m))
    }

    /// Descriptors in target order.
    pub fn descriptors(&self) -> Vec<&ModelDescriptor> {
        self.models.values().map(|m| &m.descriptor).collect()
    }

    /// Write every model to `store`.
    pub fn save(&self, store: &ArtifactStore) -> Result<()> {
        for model in self.models.values() {
            store.save(model)?;
        }
        Ok(())
    }

    /// Load whichever target models exist in `store`.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let mut set = Self::new();
        for target in Target::all() {
            if store.model_path(target.column()).exists() {
                set.insert(target, store.load(target.column())?);
            }
        }
        Ok(set)
    }
}

/// Outcome of training both targets.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// Models that trained
    pub models: ModelSet,
    /// Targets skipped for lack of data
    pub skipped: Vec<Target>,
}

impl TrainingReport {
    /// Whether some target has a model.
    pub fn any_trained(&self) -> bool {
        !self.models.is_empty()
    }

    /// Targets flagged as overfitting.
    pub fn overfitting(&self) -> Vec<Target> {
        self.models
            .iter()
            .filter(|(_, m)| m.descriptor.validation.is_overfitting)
            .map(|(t, _)| t)
            .collect()
    }
}

/// Train one model per target.
///
/// Targets are independent: one skipped for lack of data does not stop the
/// other. Structural errors still abort.
pub fn train_targets(prepared: &PreparedData, config: &PipelineConfig) -> Result<TrainingReport> {
    let mut report = TrainingReport::default();

    for spec in config.target_specs() {
        let target = spec.target;
        match train_target(prepared.training_frame(target), &spec, config)? {
            Some(model) => {
                report.models.insert(target, model);
            }
            None => report.skipped.push(target),
        }
    }

    if report.skipped.is_empty() {
        info!(models = report.models.len(), "Trained all targets");
    } else {
        let skipped: Vec<&str> = report.skipped.iter().map(|t| t.label()).collect();
        warn!(models = report.models.len(), ?skipped, "Some targets have no model");
    }
    Ok(report)
}

fn train_target(
    frame: &DataFrame,
    spec: &TargetSpec,
    config: &PipelineConfig,
) -> Result<Option<TrainedModel>> {
    let target = spec.target.column();
    let y: Vec<Option<f64>> = match frame.column(target) {
        Ok(column) => column.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
        Err(_) => vec![None; frame.height()],
    };
    Ok(train_robust_model(
        frame,
        &spec.features,
        &y,
        &spec.categorical,
        spec.label(),
        target,
        &config.trainer,
    )?)
}
