//! Polars export of the monthly panel.
//!
//! Column order: keys, calendar, flags, targets, predictions, margin,
//! seasonality, then lag and rolling columns of each target.

use crate::error::Result;
use crate::lags::LagSpec;
use crate::panel::{MonthlyPanel, PanelRow};
use crate::target::Target;
use chrono::NaiveDate;
use polars::prelude::*;

/// Store key column.
pub const STORE: &str = "store";
/// Family key column.
pub const FAMILY: &str = "family";
/// Size key column.
pub const SIZE: &str = "size";
/// First day of the row's month.
pub const MONTH_START: &str = "month_start";
/// Calendar year.
pub const YEAR: &str = "year";
/// Month of year.
pub const MONTH: &str = "month";
/// Quarter of year.
pub const QUARTER: &str = "quarter";
/// Cyclical month, sine.
pub const MONTH_SIN: &str = "month_sin";
/// Cyclical month, cosine.
pub const MONTH_COS: &str = "month_cos";
/// Cyclical quarter, sine.
pub const QUARTER_SIN: &str = "quarter_sin";
/// Cyclical quarter, cosine.
pub const QUARTER_COS: &str = "quarter_cos";
/// Campaign season of the month.
pub const SEASON: &str = "season";
/// Synthetic future row flag.
pub const IS_FUTURE: &str = "is_future";
/// Returned units.
pub const QTY_RETURNED: &str = "qty_returned";
/// Signed net units.
pub const QTY_NET: &str = "qty_net";
/// Mean unit margin.
pub const UNIT_MARGIN: &str = "unit_margin";
/// Mean relative price.
pub const RELATIVE_PRICE: &str = "relative_price";
/// Mean list price.
pub const AVG_LIST_PRICE: &str = "avg_list_price";
/// Markdown month flag.
pub const IS_MARKDOWN_PERIOD: &str = "is_markdown_period";
/// Trailing Summer share of family demand.
pub const SEASONALITY_SUMMER: &str = "seasonality_index_summer";
/// Trailing Winter share of family demand.
pub const SEASONALITY_WINTER: &str = "seasonality_index_winter";
/// Transaction lines in the cell.
pub const TRANSACTIONS: &str = "transactions";

/// Build a DataFrame from panel rows.
pub fn rows_to_dataframe<'a, I>(rows: I, spec: &LagSpec) -> Result<DataFrame>
where
    I: IntoIterator<Item = &'a PanelRow>,
{
    let rows: Vec<&PanelRow> = rows.into_iter().collect();

    let float = |f: fn(&PanelRow) -> f64| -> Vec<f64> { rows.iter().map(|r| f(r)).collect() };
    let optional =
        |f: fn(&PanelRow) -> Option<f64>| -> Vec<Option<f64>> { rows.iter().map(|r| f(r)).collect() };
    let int = |f: fn(&PanelRow) -> i32| -> Vec<i32> { rows.iter().map(|r| f(r)).collect() };

    let store: Vec<&str> = rows.iter().map(|r| r.entity.store.as_str()).collect();
    let family: Vec<&str> = rows.iter().map(|r| r.entity.family.as_str()).collect();
    let size: Vec<&str> = rows.iter().map(|r| r.entity.size.as_str()).collect();
    let season: Vec<&str> = rows.iter().map(|r| r.season.name()).collect();
    let month_start: Vec<NaiveDate> = rows.iter().map(|r| r.month.first_day()).collect();
    let is_future: Vec<bool> = rows.iter().map(|r| r.is_future).collect();
    let markdown: Vec<bool> = rows.iter().map(|r| r.margin.is_markdown_period).collect();

    let mut columns = vec![
        Column::new(STORE.into(), store),
        Column::new(FAMILY.into(), family),
        Column::new(SIZE.into(), size),
        Column::new(MONTH_START.into(), month_start),
        Column::new(YEAR.into(), int(|r| r.calendar.year)),
        Column::new(MONTH.into(), int(|r| r.calendar.month as i32)),
        Column::new(QUARTER.into(), int(|r| r.calendar.quarter as i32)),
        Column::new(MONTH_SIN.into(), float(|r| r.calendar.month_sin)),
        Column::new(MONTH_COS.into(), float(|r| r.calendar.month_cos)),
        Column::new(QUARTER_SIN.into(), float(|r| r.calendar.quarter_sin)),
        Column::new(QUARTER_COS.into(), float(|r| r.calendar.quarter_cos)),
        Column::new(SEASON.into(), season),
        Column::new(IS_FUTURE.into(), is_future),
        Column::new(
            Target::InSeason.column().into(),
            optional(|r| r.qty_in_season),
        ),
        Column::new(
            Target::OutOfSeason.column().into(),
            optional(|r| r.qty_out_of_season),
        ),
        Column::new(QTY_RETURNED.into(), optional(|r| r.qty_returned)),
        Column::new(QTY_NET.into(), optional(|r| r.qty_net)),
        Column::new(
            Target::InSeason.prediction_column().into(),
            optional(|r| r.pred_qty_in_season),
        ),
        Column::new(
            Target::OutOfSeason.prediction_column().into(),
            optional(|r| r.pred_qty_out_of_season),
        ),
        Column::new(UNIT_MARGIN.into(), float(|r| r.margin.unit_margin)),
        Column::new(RELATIVE_PRICE.into(), float(|r| r.margin.relative_price)),
        Column::new(AVG_LIST_PRICE.into(), float(|r| r.margin.avg_list_price)),
        Column::new(IS_MARKDOWN_PERIOD.into(), markdown),
        Column::new(SEASONALITY_SUMMER.into(), float(|r| r.seasonality.summer)),
        Column::new(SEASONALITY_WINTER.into(), float(|r| r.seasonality.winter)),
    ];

    for target in Target::all() {
        for (i, &lag) in spec.lags.iter().enumerate() {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|r| r.history(target).lags.get(i).copied().flatten())
                .collect();
            columns.push(Column::new(target.lag_column(lag).into(), values));
        }
        let rolling: Vec<Option<f64>> = rows.iter().map(|r| r.history(target).rolling).collect();
        columns.push(Column::new(
            target.rolling_column(spec.rolling_window).into(),
            rolling,
        ));
    }

    let transactions: Vec<u32> = rows
        .iter()
        .map(|r| u32::try_from(r.transactions).unwrap_or(u32::MAX))
        .collect();
    columns.push(Column::new(TRANSACTIONS.into(), transactions));

    Ok(DataFrame::new(columns)?)
}

impl MonthlyPanel {
    /// Every row as a DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        rows_to_dataframe(self.rows(), self.lag_spec())
    }

    /// Historical rows only.
    pub fn historical_frame(&self) -> Result<DataFrame> {
        rows_to_dataframe(self.historical_rows(), self.lag_spec())
    }

    /// Future rows only.
    pub fn future_frame(&self) -> Result<DataFrame> {
        rows_to_dataframe(self.future_rows(), self.lag_spec())
    }

    /// Historical rows that carry a value for `target`.
    pub fn training_frame(&self, target: Target) -> Result<DataFrame> {
        rows_to_dataframe(
            self.historical_rows().filter(|r| r.actual(target).is_some()),
            self.lag_spec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::panel::PanelBuilder;
    use atelier_data::{Transaction, TransactionTable};

    fn table() -> TransactionTable {
        [(2024, 11), (2025, 1)]
            .into_iter()
            .map(|(y, m)| Transaction {
                document_date: NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
                store_id: "T01".to_string(),
                product_id: String::new(),
                product_family: "Abrigos".to_string(),
                size: "L".to_string(),
                signed_quantity: 2.0,
                subtotal: 120.0,
                list_price: 60.0,
                unit_cost: 30.0,
                season_label: "I25".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_frame_shape_and_columns() {
        let panel = PanelBuilder::default().build(&table(), 2).unwrap();
        let df = panel.to_dataframe().unwrap();

        assert_eq!(df.height(), 5);
        // 25 fixed columns, 4 history columns per target, transactions
        assert_eq!(df.width(), 25 + 8 + 1);
        assert!(df.column("lag_12_qty_out_of_season").is_ok());
        assert!(df.column("rolling_6m_qty_in_season").is_ok());

        let future = df.column(IS_FUTURE).unwrap().bool().unwrap();
        assert_eq!(future.into_iter().flatten().filter(|f| *f).count(), 2);

        let target = df.column("qty_in_season").unwrap().f64().unwrap();
        assert_eq!(target.null_count(), 2);
        assert_eq!(target.get(1), Some(0.0));
    }

    #[test]
    fn test_split_frames() {
        let panel = PanelBuilder::default().build(&table(), 2).unwrap();
        assert_eq!(panel.historical_frame().unwrap().height(), 3);
        assert_eq!(panel.future_frame().unwrap().height(), 2);
        assert_eq!(panel.training_frame(Target::InSeason).unwrap().height(), 3);
        assert_eq!(
            panel.last_historical_month(),
            Month::new(2025, 1).unwrap()
        );
    }
}
