//! Trained model artifact and on-disk persistence
//!
//! An artifact is stored as two JSON files in a models directory:
//!
//! - `{target}.model.json`: the encoder and the fitted ensemble
//! - `{target}.descriptor.json`: features, validation metrics and prediction
//!   constraints, readable without deserialising the model

use crate::boosting::GradientBoostedTrees;
use crate::dataset::FeatureEncoder;
use crate::error::Result;
use crate::predictor::PredictionConstraints;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Validation metrics of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// In-sample R²
    pub r2: f64,
    /// Mean R² over the time-series folds
    pub cv_r2: f64,
    /// R² of each fold
    pub cv_fold_r2: Vec<f64>,
    /// In-sample RMSE
    pub rmse: f64,
    /// In-sample MAE
    pub mae: f64,
    /// r2 − cv_r2
    pub overfitting_score: f64,
    /// Overfitting score above the configured threshold
    pub is_overfitting: bool,
    /// Rows used for the final fit
    pub n_samples: usize,
}

/// Sidecar metadata of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Human-readable label, e.g. `IN SEASON`
    pub label: String,
    /// Target column the model predicts
    pub target: String,
    /// Name of the selected configuration
    pub model_name: String,
    /// Feature columns in model order
    pub features: Vec<String>,
    /// Categorical subset of `features`
    pub categorical_features: Vec<String>,
    /// Validation metrics
    pub validation: ValidationMetrics,
    /// Output bounds applied at inference
    pub prediction_constraints: PredictionConstraints,
    /// Training timestamp
    pub trained_at: DateTime<Utc>,
}

/// A fitted model with its encoder and descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Fitted ensemble
    pub model: GradientBoostedTrees,
    /// Categorical vocabularies and feature order
    pub encoder: FeatureEncoder,
    /// Sidecar metadata
    pub descriptor: ModelDescriptor,
}

#[derive(Serialize)]
struct BlobRef<'a> {
    encoder: &'a FeatureEncoder,
    model: &'a GradientBoostedTrees,
}

#[derive(Deserialize)]
struct Blob {
    encoder: FeatureEncoder,
    model: GradientBoostedTrees,
}

/// Directory of saved artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the model blob for `target`.
    pub fn model_path(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{target}.model.json"))
    }

    /// Path of the descriptor for `target`.
    pub fn descriptor_path(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{target}.descriptor.json"))
    }

    /// Write both files for `model`, keyed by its target.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = &model.descriptor.target;

        let blob = BlobRef {
            encoder: &model.encoder,
            model: &model.model,
        };
        fs::write(self.model_path(target), serde_json::to_string(&blob)?)?;
        fs::write(
            self.descriptor_path(target),
            serde_json::to_string_pretty(&model.descriptor)?,
        )?;

        info!(target = %target, dir = %self.dir.display(), "Saved model artifact");
        Ok(())
    }

    /// Load the artifact for `target`.
    pub fn load(&self, target: &str) -> Result<TrainedModel> {
        let blob: Blob = serde_json::from_str(&fs::read_to_string(self.model_path(target))?)?;
        Ok(TrainedModel {
            model: blob.model,
            encoder: blob.encoder,
            descriptor: self.load_descriptor(target)?,
        })
    }

    /// Load only the descriptor for `target`.
    pub fn load_descriptor(&self, target: &str) -> Result<ModelDescriptor> {
        Ok(serde_json::from_str(&fs::read_to_string(
            self.descriptor_path(target),
        )?)?)
    }

    /// Targets with a descriptor in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut targets = Vec::new();
        if !self.dir.exists() {
            return Ok(targets);
        }
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(target) = name.to_string_lossy().strip_suffix(".descriptor.json") {
                targets.push(target.to_string());
            }
        }
        targets.sort();
        Ok(targets)
    }
}
