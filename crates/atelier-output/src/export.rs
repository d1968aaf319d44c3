//! CSV and JSON export of the monthly panel and of forecasts.
//!
//! Panel exports carry one record per (store, family, size, month) with both
//! targets, predictions and the engineered features. Forecast exports carry
//! only the future months with their predicted demand.

use atelier_features::frame;
use atelier_features::{MonthlyPanel, PanelRow, Target};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported extension {:?}",
                other.unwrap_or("")
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One panel row, flattened for export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelRecord {
    /// Store identifier.
    pub store: String,
    /// Product family.
    pub family: String,
    /// Size.
    pub size: String,
    /// Month as `YYYY-MM`.
    pub month: String,
    /// Synthetic future row.
    pub is_future: bool,
    /// Campaign season of the month.
    pub season: String,
    /// In-season units sold.
    pub qty_in_season: Option<f64>,
    /// Out-of-season units sold.
    pub qty_out_of_season: Option<f64>,
    /// Units returned.
    pub qty_returned: Option<f64>,
    /// Signed net units.
    pub qty_net: Option<f64>,
    /// In-season prediction.
    pub pred_qty_in_season: Option<f64>,
    /// Out-of-season prediction.
    pub pred_qty_out_of_season: Option<f64>,
    /// Mean unit margin.
    pub unit_margin: f64,
    /// Mean relative price.
    pub relative_price: f64,
    /// Mean list price.
    pub avg_list_price: f64,
    /// Markdown month.
    pub is_markdown_period: bool,
    /// Trailing Summer share of family demand.
    pub seasonality_index_summer: f64,
    /// Trailing Winter share of family demand.
    pub seasonality_index_winter: f64,
    /// Lag and rolling features by column name.
    pub history: BTreeMap<String, Option<f64>>,
    /// Transaction lines in the cell.
    pub transactions: usize,
}

/// Lag and rolling column names with their values for `row`.
fn history_values(row: &PanelRow, panel: &MonthlyPanel) -> Vec<(String, Option<f64>)> {
    let spec = panel.lag_spec();
    let mut values = Vec::new();
    for target in Target::all() {
        let history = row.history(target);
        for (i, &lag) in spec.lags.iter().enumerate() {
            values.push((target.lag_column(lag), history.lags.get(i).copied().flatten()));
        }
        values.push((target.rolling_column(spec.rolling_window), history.rolling));
    }
    values
}

impl PanelRecord {
    /// Flatten one panel row.
    pub fn from_row(row: &PanelRow, panel: &MonthlyPanel) -> Self {
        Self {
            store: row.entity.store.clone(),
            family: row.entity.family.clone(),
            size: row.entity.size.clone(),
            month: row.month.to_string(),
            is_future: row.is_future,
            season: row.season.name().to_string(),
            qty_in_season: row.qty_in_season,
            qty_out_of_season: row.qty_out_of_season,
            qty_returned: row.qty_returned,
            qty_net: row.qty_net,
            pred_qty_in_season: row.pred_qty_in_season,
            pred_qty_out_of_season: row.pred_qty_out_of_season,
            unit_margin: row.margin.unit_margin,
            relative_price: row.margin.relative_price,
            avg_list_price: row.margin.avg_list_price,
            is_markdown_period: row.margin.is_markdown_period,
            seasonality_index_summer: row.seasonality.summer,
            seasonality_index_winter: row.seasonality.winter,
            history: history_values(row, panel).into_iter().collect(),
            transactions: row.transactions,
        }
    }
}

/// A whole panel ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelExport {
    /// Records in panel order.
    pub records: Vec<PanelRecord>,
    /// History columns in frame order.
    pub history_columns: Vec<String>,
}

impl PanelExport {
    /// Flatten every row of `panel`.
    pub fn from_panel(panel: &MonthlyPanel) -> Self {
        let spec = panel.lag_spec();
        let history_columns = Target::all()
            .into_iter()
            .flat_map(|t| {
                spec.lags
                    .iter()
                    .map(move |&lag| t.lag_column(lag))
                    .chain(std::iter::once(t.rolling_column(spec.rolling_window)))
            })
            .collect();
        Self {
            records: panel.iter().map(|r| PanelRecord::from_row(r, panel)).collect(),
            history_columns,
        }
    }

    fn header(&self) -> Vec<&str> {
        let mut header = vec![
            frame::STORE,
            frame::FAMILY,
            frame::SIZE,
            frame::MONTH,
            frame::IS_FUTURE,
            frame::SEASON,
            Target::InSeason.column(),
            Target::OutOfSeason.column(),
            frame::QTY_RETURNED,
            frame::QTY_NET,
            Target::InSeason.prediction_column(),
            Target::OutOfSeason.prediction_column(),
            frame::UNIT_MARGIN,
            frame::RELATIVE_PRICE,
            frame::AVG_LIST_PRICE,
            frame::IS_MARKDOWN_PERIOD,
            frame::SEASONALITY_SUMMER,
            frame::SEASONALITY_WINTER,
        ];
        header.extend(self.history_columns.iter().map(String::as_str));
        header.push(frame::TRANSACTIONS);
        header
    }
}

impl Exporter for PanelExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(self.header())?;
                for r in &self.records {
                    let mut record = vec![
                        r.store.clone(),
                        r.family.clone(),
                        r.size.clone(),
                        r.month.clone(),
                        r.is_future.to_string(),
                        r.season.clone(),
                        optional(r.qty_in_season),
                        optional(r.qty_out_of_season),
                        optional(r.qty_returned),
                        optional(r.qty_net),
                        optional(r.pred_qty_in_season),
                        optional(r.pred_qty_out_of_season),
                        r.unit_margin.to_string(),
                        r.relative_price.to_string(),
                        r.avg_list_price.to_string(),
                        r.is_markdown_period.to_string(),
                        r.seasonality_index_summer.to_string(),
                        r.seasonality_index_winter.to_string(),
                    ];
                    record.extend(
                        self.history_columns
                            .iter()
                            .map(|c| optional(r.history.get(c).copied().flatten())),
                    );
                    record.push(r.transactions.to_string());
                    wtr.write_record(&record)?;
                }
                finish(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.records)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.records)?),
        }
    }
}

/// Predicted demand of one entity in one future month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastRecord {
    /// Store identifier.
    pub store: String,
    /// Product family.
    pub family: String,
    /// Size.
    pub size: String,
    /// Month as `YYYY-MM`.
    pub month: String,
    /// In-season prediction.
    pub pred_qty_in_season: Option<f64>,
    /// Out-of-season prediction.
    pub pred_qty_out_of_season: Option<f64>,
    /// Sum of the available predictions.
    pub pred_qty_total: Option<f64>,
}

impl ForecastRecord {
    /// Forecast of one future row.
    pub fn from_row(row: &PanelRow) -> Self {
        let total = match (row.pred_qty_in_season, row.pred_qty_out_of_season) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
        Self {
            store: row.entity.store.clone(),
            family: row.entity.family.clone(),
            size: row.entity.size.clone(),
            month: row.month.to_string(),
            pred_qty_in_season: row.pred_qty_in_season,
            pred_qty_out_of_season: row.pred_qty_out_of_season,
            pred_qty_total: total,
        }
    }
}

/// Future rows of a panel with their predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastExport {
    /// Records ordered by entity then month.
    pub records: Vec<ForecastRecord>,
}

impl ForecastExport {
    /// Forecast records of every future row of `panel`.
    pub fn from_panel(panel: &MonthlyPanel) -> Self {
        Self {
            records: panel.future_rows().map(ForecastRecord::from_row).collect(),
        }
    }
}

impl Exporter for ForecastExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in &self.records {
                    wtr.serialize(record)?;
                }
                finish(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.records)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.records)?),
        }
    }
}

/// Write the whole panel to `path` as CSV.
pub fn export_panel_csv(panel: &MonthlyPanel, path: &Path) -> Result<(), ExportError> {
    PanelExport::from_panel(panel).export_to_file(path, ExportFormat::Csv)
}

/// Write the whole panel to `path` as pretty JSON.
pub fn export_panel_json(panel: &MonthlyPanel, path: &Path) -> Result<(), ExportError> {
    PanelExport::from_panel(panel).export_to_file(path, ExportFormat::PrettyJson)
}

/// Write the future rows and their predictions to `path` as CSV.
pub fn export_forecast_csv(panel: &MonthlyPanel, path: &Path) -> Result<(), ExportError> {
    ForecastExport::from_panel(panel).export_to_file(path, ExportFormat::Csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_data::{Transaction, TransactionTable};
    use atelier_features::{Month, PanelBuilder};
    use chrono::NaiveDate;

    fn panel() -> MonthlyPanel {
        let table: TransactionTable = [(2025, 1, "T01"), (2025, 2, "T01"), (2025, 2, "T02")]
            .into_iter()
            .map(|(y, m, store)| Transaction {
                document_date: NaiveDate::from_ymd_opt(y, m, 3).unwrap(),
                store_id: store.to_string(),
                product_id: String::new(),
                product_family: "Punto".to_string(),
                size: "S".to_string(),
                signed_quantity: 4.0,
                subtotal: 100.0,
                list_price: 25.0,
                unit_cost: 10.0,
                season_label: "I25".to_string(),
            })
            .collect();
        PanelBuilder::default().build(&table, 2).unwrap()
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
        assert_eq!(
            ExportFormat::from_path(Path::new("out/panel.csv")).unwrap(),
            ExportFormat::Csv
        );
        assert!(ExportFormat::from_path(Path::new("panel.xlsx")).is_err());
    }

    #[test]
    fn test_panel_csv() {
        let export = PanelExport::from_panel(&panel());
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        // T01: Jan, Feb + 2 future; T02: Feb + 2 future
        assert_eq!(lines.len(), 1 + 7);
        assert!(lines[0].starts_with("store,family,size,month,is_future,season"));
        assert!(lines[0].contains("lag_1_qty_in_season"));
        assert!(lines[0].ends_with("transactions"));
        assert!(lines[1].starts_with("T01,Punto,S,2025-01,false,Winter,4,0,"));

        let width = lines[0].split(',').count();
        assert!(lines.iter().all(|l| l.split(',').count() == width));
    }

    #[test]
    fn test_panel_json() {
        let export = PanelExport::from_panel(&panel());
        let json = export.export_to_string(ExportFormat::Json).unwrap();
        let records: Vec<PanelRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(records, export.records);
        assert_eq!(records[1].history["lag_1_qty_in_season"], Some(4.0));
    }

    #[test]
    fn test_forecast_records() {
        let mut panel = panel();
        let entity = panel.entities()[0].clone();
        let month = Month::new(2025, 3).unwrap();
        panel.set_prediction(&entity, month, Target::InSeason, 5.5);

        let export = ForecastExport::from_panel(&panel);
        assert_eq!(export.records.len(), 4);
        assert_eq!(export.records[0].month, "2025-03");
        assert_eq!(export.records[0].pred_qty_total, Some(5.5));
        assert_eq!(export.records[1].pred_qty_total, None);

        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("store,family,size,month,pred_qty_in_season"));
        assert!(csv.contains("T01,Punto,S,2025-03,5.5,,5.5"));
    }
}
