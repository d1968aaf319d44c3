//! Loading transactions, configuration and models for a command.

use atelier::{ModelSet, PipelineConfig, PipelineError};
use atelier_data::{DataError, TransactionTable};
use atelier_model::ArtifactStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for input loading.
#[derive(Debug, thiserror::Error)]
pub(crate) enum InputError {
    /// Transaction file unreadable or invalid.
    #[error("Cannot load transactions from {path}: {source}")]
    Transactions {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: DataError,
    },
    /// Configuration file unreadable or invalid.
    #[error("Cannot load configuration: {0}")]
    Config(#[source] PipelineError),
    /// No model artifacts in the directory.
    #[error("No trained models found in {0}")]
    NoModels(PathBuf),
    /// Models present but unreadable.
    #[error("Cannot load models: {0}")]
    Models(#[from] PipelineError),
}

/// Options shared by every command that reads transactions.
#[derive(Debug, Clone)]
pub(crate) struct InputConfig {
    /// Transaction CSV export.
    pub input: PathBuf,
    /// Optional JSON pipeline configuration.
    pub config: Option<PathBuf>,
    /// Show spinners while loading.
    pub progress: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("transactions.csv"),
            config: None,
            progress: true,
        }
    }
}

/// A spinner with the CLI's style, hidden when `enabled` is false.
pub(crate) fn spinner(enabled: bool, message: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

/// Pipeline configuration from the file, or the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<PipelineConfig, InputError> {
    match path {
        Some(path) => PipelineConfig::from_json_path(path).map_err(InputError::Config),
        None => Ok(PipelineConfig::default()),
    }
}

/// Transactions and configuration of a command.
pub(crate) fn load_inputs(
    options: &InputConfig,
) -> Result<(TransactionTable, PipelineConfig), InputError> {
    let config = load_config(options.config.as_deref())?;

    let pb = spinner(options.progress, "Loading transactions...");
    match TransactionTable::from_csv_path(&options.input) {
        Ok(table) => {
            pb.finish_with_message(format!("Loaded {} transactions", table.len()));
            Ok((table, config))
        }
        Err(source) => {
            pb.finish_with_message("Failed!");
            Err(InputError::Transactions {
                path: options.input.clone(),
                source,
            })
        }
    }
}

/// Every model saved in `dir`.
pub(crate) fn load_models(dir: &Path) -> Result<ModelSet, InputError> {
    let models = ModelSet::load(&ArtifactStore::new(dir))?;
    if models.is_empty() {
        return Err(InputError::NoModels(dir.to_path_buf()));
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs() {
        let dir = std::env::temp_dir().join(format!("atelier-bin-{}", std::process::id()));
        assert!(matches!(load_models(&dir), Err(InputError::NoModels(_))));

        let options = InputConfig {
            input: dir.join("missing.csv"),
            progress: false,
            ..InputConfig::default()
        };
        assert!(matches!(
            load_inputs(&options),
            Err(InputError::Transactions { .. })
        ));
        assert!(load_config(None).is_ok());
        assert!(matches!(
            load_config(Some(&dir.join("missing.json"))),
            Err(InputError::Config(_))
        ));
    }
}
