//! Training summary reports.
//!
//! One line per trained target with its fit and validation metrics, plus the
//! targets that were skipped. Rendered for the terminal or as Markdown.

use atelier_model::ModelDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics of one trained model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSummary {
    /// Model label, e.g. `IN SEASON`.
    pub label: String,
    /// Target column.
    pub target: String,
    /// Selected configuration.
    pub model_name: String,
    /// Number of features.
    pub n_features: usize,
    /// Rows used for the final fit.
    pub n_samples: usize,
    /// In-sample R².
    pub r2: f64,
    /// Mean cross-validated R².
    pub cv_r2: f64,
    /// In-sample RMSE.
    pub rmse: f64,
    /// In-sample MAE.
    pub mae: f64,
    /// R² minus CV R².
    pub overfitting_score: f64,
    /// Overfitting flag.
    pub is_overfitting: bool,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
}

impl From<&ModelDescriptor> for ModelSummary {
    fn from(descriptor: &ModelDescriptor) -> Self {
        let v = &descriptor.validation;
        Self {
            label: descriptor.label.clone(),
            target: descriptor.target.clone(),
            model_name: descriptor.model_name.clone(),
            n_features: descriptor.features.len(),
            n_samples: v.n_samples,
            r2: v.r2,
            cv_r2: v.cv_r2,
            rmse: v.rmse,
            mae: v.mae,
            overfitting_score: v.overfitting_score,
            is_overfitting: v.is_overfitting,
            trained_at: descriptor.trained_at,
        }
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: R² {:.3}, CV R² {:.3}, RMSE {:.2} ({} rows)",
            self.label, self.r2, self.cv_r2, self.rmse, self.n_samples
        )?;
        if self.is_overfitting {
            write!(f, " [overfitting {:.3}]", self.overfitting_score)?;
        }
        Ok(())
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingSummary {
    /// Trained models in target order.
    pub models: Vec<ModelSummary>,
    /// Labels of targets without a model.
    pub skipped: Vec<String>,
}

impl TrainingSummary {
    /// Build a summary from model descriptors and skipped target labels.
    pub fn new<'a, I>(descriptors: I, skipped: Vec<String>) -> Self
    where
        I: IntoIterator<Item = &'a ModelDescriptor>,
    {
        Self {
            models: descriptors.into_iter().map(ModelSummary::from).collect(),
            skipped,
        }
    }

    /// Whether some model is flagged as overfitting.
    pub fn any_overfitting(&self) -> bool {
        self.models.iter().any(|m| m.is_overfitting)
    }

    /// Generate ASCII table representation.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nTraining Summary\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if self.models.is_empty() {
            output.push_str("  No models trained\n");
        } else {
            output.push_str(&format!(
                "{:<16} {:<28} {:>7} {:>7} {:>7} {:>9} {:>8}\n",
                "Target", "Model", "Rows", "R²", "CV R²", "RMSE", "Overfit"
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for m in &self.models {
                output.push_str(&format!(
                    "{:<16} {:<28} {:>7} {:>7.3} {:>7.3} {:>9.2} {:>8}\n",
                    m.label,
                    m.model_name,
                    m.n_samples,
                    m.r2,
                    m.cv_r2,
                    m.rmse,
                    if m.is_overfitting { "YES" } else { "no" }
                ));
            }
        }

        if !self.skipped.is_empty() {
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!("  Skipped (insufficient data): {}\n", self.skipped.join(", ")));
        }

        for m in self.models.iter().filter(|m| m.is_overfitting) {
            output.push_str(&format!(
                "  Warning: {} overfitting score {:.3} (R² {:.3} vs CV R² {:.3})\n",
                m.label, m.overfitting_score, m.r2, m.cv_r2
            ));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }

    /// Generate Markdown representation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Training Summary\n\n");

        if !self.models.is_empty() {
            output.push_str("| Target | Model | Rows | R² | CV R² | RMSE | MAE | Overfitting |\n");
            output.push_str("|--------|-------|------|----|-------|------|-----|-------------|\n");
            for m in &self.models {
                output.push_str(&format!(
                    "| {} | {} | {} | {:.3} | {:.3} | {:.2} | {:.2} | {} |\n",
                    m.label,
                    m.model_name,
                    m.n_samples,
                    m.r2,
                    m.cv_r2,
                    m.rmse,
                    m.mae,
                    if m.is_overfitting {
                        format!("**{:.3}**", m.overfitting_score)
                    } else {
                        format!("{:.3}", m.overfitting_score)
                    }
                ));
            }
            output.push('\n');
        }

        if !self.skipped.is_empty() {
            output.push_str("## Skipped\n\n");
            for label in &self.skipped {
                output.push_str(&format!("- {label}: insufficient data\n"));
            }
        }

        output
    }
}
