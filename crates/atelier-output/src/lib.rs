#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/atelier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod summary;

pub use export::{
    ExportError, ExportFormat, Exporter, ForecastExport, ForecastRecord, PanelExport, PanelRecord,
    export_forecast_csv, export_panel_csv, export_panel_json,
};
pub use summary::{ModelSummary, TrainingSummary};
