//! Atelier CLI binary.
//!
//! Builds monthly panels, trains the in-season and out-of-season demand
//! models, and writes multi-month forecasts.

mod integration;

use atelier::{CeilingSource, Forecaster, build_panel_and_train, train_targets};
use atelier_features::{Month, PanelBuilder, Target};
use atelier_model::ArtifactStore;
use atelier_output::{ExportFormat, Exporter, PanelExport, TrainingSummary, export_forecast_csv};
use clap::{Parser, Subcommand, ValueEnum};
use integration::inputs::{InputConfig, load_inputs, load_models, spinner};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier: monthly demand forecasting for fashion retail", long_about = None)]
#[command(version)]
struct Cli {
    /// Hide progress spinners
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the monthly panel and export it
    Panel {
        /// Transaction CSV export
        #[arg(long)]
        input: PathBuf,

        /// Future months to append
        #[arg(long, default_value = "3")]
        horizon: u32,

        /// Output file (.csv or .json)
        #[arg(long)]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Train both demand models and save them
    Train {
        /// Transaction CSV export
        #[arg(long)]
        input: PathBuf,

        /// Directory for model artifacts
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,

        /// Last month used for training (YYYY-MM)
        #[arg(long)]
        cutoff: Option<Month>,

        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep rows whose target is zero
        #[arg(long)]
        keep_zero_targets: bool,

        /// Summary format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Forecast future months with saved models
    Forecast {
        /// Transaction CSV export
        #[arg(long)]
        input: PathBuf,

        /// Directory holding model artifacts
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,

        /// Months to forecast
        #[arg(long, default_value = "6")]
        horizon: u32,

        /// Forecast CSV
        #[arg(long)]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bound predictions by each table's reference column instead of
        /// each entity's history
        #[arg(long)]
        frame_ceiling: bool,
    },

    /// Show saved model descriptors
    Inspect {
        /// Directory holding model artifacts
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: InspectFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum InspectFormat {
    Text,
    Json,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("atelier=info".parse()?))
        .init();

    let cli = Cli::parse();
    let progress = !cli.quiet;

    match cli.command {
        Commands::Panel {
            input,
            horizon,
            output,
            config,
        } => {
            let options = InputConfig {
                input,
                config,
                progress,
            };
            build_panel(&options, horizon, &output)?;
        }
        Commands::Train {
            input,
            models_dir,
            cutoff,
            config,
            keep_zero_targets,
            format,
        } => {
            let options = InputConfig {
                input,
                config,
                progress,
            };
            train(&options, &models_dir, cutoff, keep_zero_targets, format)?;
        }
        Commands::Forecast {
            input,
            models_dir,
            horizon,
            output,
            config,
            frame_ceiling,
        } => {
            let options = InputConfig {
                input,
                config,
                progress,
            };
            let ceiling = if frame_ceiling {
                CeilingSource::Frame
            } else {
                CeilingSource::Entity
            };
            forecast(&options, &models_dir, horizon, &output, ceiling)?;
        }
        Commands::Inspect { models_dir, format } => {
            inspect(&models_dir, format)?;
        }
    }

    Ok(())
}

fn build_panel(
    options: &InputConfig,
    horizon: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = ExportFormat::from_path(output)?;
    let (table, config) = load_inputs(options)?;

    let sales = table.summary();
    println!(
        "\nTransactions: {}  Stores: {}  Families: {}",
        table.len(),
        table.stores().len(),
        table.families().len()
    );
    println!(
        "Units: {:.0} gross, {:.0} returned ({:.1}% return rate)",
        sales.gross_units,
        sales.returned_units,
        sales.return_rate * 100.0
    );

    let pb = spinner(options.progress, "Building monthly panel...");
    let panel = PanelBuilder::new(config.panel).build(&table, horizon)?;
    pb.finish_with_message(format!(
        "Built {} rows ({} future) through {}",
        panel.len(),
        panel.future_rows().count(),
        panel.last_historical_month()
    ));

    PanelExport::from_panel(&panel).export_to_file(output, format)?;
    println!("Panel written to {}", output.display());
    Ok(())
}

fn train(
    options: &InputConfig,
    models_dir: &Path,
    cutoff: Option<Month>,
    keep_zero_targets: bool,
    format: ReportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let (table, mut config) = load_inputs(options)?;
    if cutoff.is_some() {
        config.training_cutoff = cutoff;
    }
    if keep_zero_targets {
        config.trainer.drop_zero_targets = false;
    }

    let pb = spinner(options.progress, "Preparing training data...");
    let prepared = build_panel_and_train(&table, 0, &config)?;
    pb.set_message("Training models...");
    let report = train_targets(&prepared, &config)?;
    pb.finish_with_message(format!("Trained {} model(s)", report.models.len()));

    std::fs::create_dir_all(models_dir)?;
    let store = ArtifactStore::new(models_dir);
    report.models.save(&store)?;
    info!(dir = %models_dir.display(), models = report.models.len(), "Saved models");

    let skipped = report.skipped.iter().map(|t| t.label().to_string()).collect();
    let summary = TrainingSummary::new(report.models.descriptors(), skipped);
    match format {
        ReportFormat::Text => println!("{}", summary.to_ascii_table()),
        ReportFormat::Markdown => println!("{}", summary.to_markdown()),
    }

    if !report.any_trained() {
        return Err("no model could be trained".into());
    }
    Ok(())
}

fn forecast(
    options: &InputConfig,
    models_dir: &Path,
    horizon: u32,
    output: &Path,
    ceiling: CeilingSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let models = load_models(models_dir)?;
    let (table, config) = load_inputs(options)?;

    let pb = spinner(options.progress, "Building monthly panel...");
    let mut panel = PanelBuilder::new(config.panel).build(&table, horizon)?;
    pb.set_message("Forecasting...");
    let points = Forecaster::new(ceiling).forecast(&mut panel, &models)?;
    pb.finish_with_message(format!("Forecast {} value(s)", points.len()));

    export_forecast_csv(&panel, output)?;

    println!("\nForecast months:");
    for month in panel.future_months() {
        let (in_season, out_of_season) = points
            .iter()
            .filter(|p| p.month == month)
            .fold((0.0, 0.0), |(a, b), p| match p.target {
                Target::InSeason => (a + p.value, b),
                Target::OutOfSeason => (a, b + p.value),
            });
        println!(
            "  {}  in season {:>10.1}  out of season {:>10.1}",
            month, in_season, out_of_season
        );
    }
    println!("Forecast written to {}", output.display());
    Ok(())
}

fn inspect(models_dir: &Path, format: InspectFormat) -> Result<(), Box<dyn std::error::Error>> {
    let store = ArtifactStore::new(models_dir);
    let descriptors = store
        .list()?
        .iter()
        .map(|target| store.load_descriptor(target))
        .collect::<Result<Vec<_>, _>>()?;

    if descriptors.is_empty() {
        return Err(format!("no model descriptors in {}", models_dir.display()).into());
    }

    match format {
        InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&descriptors)?),
        InspectFormat::Text => {
            println!("{}", TrainingSummary::new(&descriptors, Vec::new()).to_ascii_table());
            for d in &descriptors {
                println!("{} ({}), trained {}", d.label, d.target, d.trained_at);
                println!("  Features: {}", d.features.join(", "));
                println!("  Categorical: {}", d.categorical_features.join(", "));
                let c = &d.prediction_constraints;
                match c.max_multiplier {
                    Some(m) => println!(
                        "  Bounds: [{}, {} × max {}]",
                        c.min_value, m, c.reference_column
                    ),
                    None => println!("  Bounds: [{}, unbounded]", c.min_value),
                }
                println!();
            }
        }
    }
    Ok(())
}
