//! Validated transaction table.
//!
//! One [`Transaction`] per sales line. The table is immutable once built:
//! downstream stages only borrow it and derive their own copies.

use crate::columns::{self, REQUIRED_COLUMNS, UNKNOWN_FAMILY};
use crate::dates::parse_document_date;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// A single sales line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sale date
    pub document_date: NaiveDate,
    /// Store identifier
    pub store_id: String,
    /// Product identifier, empty when the export has none
    pub product_id: String,
    /// Product family / category
    pub product_family: String,
    /// Garment size
    pub size: String,
    /// Units sold, negative for returns
    pub signed_quantity: f64,
    /// Monetary subtotal
    pub subtotal: f64,
    /// List price
    pub list_price: f64,
    /// Unit cost
    pub unit_cost: f64,
    /// Season label such as `I25`
    pub season_label: String,
}

impl Transaction {
    /// Whether the line is a return.
    pub fn is_return(&self) -> bool {
        self.signed_quantity < 0.0
    }
}

/// Immutable, validated set of transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    rows: Vec<Transaction>,
}

impl TransactionTable {
    /// Wrap already-validated transactions.
    pub const fn new(rows: Vec<Transaction>) -> Self {
        Self { rows }
    }

    /// Build a table from a polars DataFrame honouring the column contract.
    ///
    /// # Errors
    /// Returns a format error when a required column is missing, a date
    /// cannot be parsed, or a numeric field holds text.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        for name in REQUIRED_COLUMNS {
            if df.column(name).is_err() {
                return Err(DataError::missing_column(*name));
            }
        }

        let dates = date_column(df, columns::DOCUMENT_DATE)?;
        let stores = string_column(df, columns::STORE_ID)?;
        let products = if df.column(columns::PRODUCT_ID).is_ok() {
            string_column(df, columns::PRODUCT_ID)?
        } else {
            vec![String::new(); df.height()]
        };
        let families = string_column(df, columns::PRODUCT_FAMILY)?;
        let sizes = string_column(df, columns::SIZE)?;
        let quantities = numeric_column(df, columns::SIGNED_QUANTITY)?;
        let subtotals = numeric_column(df, columns::SUBTOTAL)?;
        let list_prices = numeric_column(df, columns::LIST_PRICE)?;
        let unit_costs = numeric_column(df, columns::UNIT_COST)?;
        let seasons = string_column(df, columns::SEASON_LABEL)?;

        let rows = (0..df.height())
            .map(|i| Transaction {
                document_date: dates[i],
                store_id: stores[i].clone(),
                product_id: products[i].clone(),
                product_family: if families[i].is_empty() {
                    UNKNOWN_FAMILY.to_string()
                } else {
                    families[i].clone()
                },
                size: sizes[i].clone(),
                signed_quantity: quantities[i],
                subtotal: subtotals[i],
                list_price: list_prices[i],
                unit_cost: unit_costs[i],
                season_label: seasons[i].clone(),
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), "Loaded transactions from DataFrame");
        Ok(Self { rows })
    }

    /// Load a CSV export honouring the column contract.
    ///
    /// Every cell is read as text and then validated exactly like
    /// [`TransactionTable::from_dataframe`].
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        if let Some(missing) = columns::first_missing(headers.iter()) {
            return Err(DataError::missing_column(missing));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(record.get(i).unwrap_or_default().to_string());
            }
        }

        let frame_columns = headers
            .iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name.into(), values))
            .collect::<Vec<_>>();
        let df = DataFrame::new(frame_columns)?;

        let table = Self::from_dataframe(&df)?;
        info!(path = %path.display(), rows = table.len(), "Loaded transactions from CSV");
        Ok(table)
    }

    /// Convert back into a polars DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<NaiveDate> = self.rows.iter().map(|t| t.document_date).collect();
        let text = |f: fn(&Transaction) -> String| -> Vec<String> {
            self.rows.iter().map(f).collect()
        };
        let number =
            |f: fn(&Transaction) -> f64| -> Vec<f64> { self.rows.iter().map(f).collect() };

        let df = DataFrame::new(vec![
            Column::new(columns::DOCUMENT_DATE.into(), dates),
            Column::new(columns::STORE_ID.into(), text(|t| t.store_id.clone())),
            Column::new(columns::PRODUCT_ID.into(), text(|t| t.product_id.clone())),
            Column::new(columns::PRODUCT_FAMILY.into(), text(|t| t.product_family.clone())),
            Column::new(columns::SIZE.into(), text(|t| t.size.clone())),
            Column::new(
                columns::SIGNED_QUANTITY.into(),
                number(|t| t.signed_quantity),
            ),
            Column::new(columns::SUBTOTAL.into(), number(|t| t.subtotal)),
            Column::new(columns::LIST_PRICE.into(), number(|t| t.list_price)),
            Column::new(columns::UNIT_COST.into(), number(|t| t.unit_cost)),
            Column::new(columns::SEASON_LABEL.into(), text(|t| t.season_label.clone())),
        ])?;
        Ok(df)
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over transactions.
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.rows.iter()
    }

    /// Borrow the transactions as a slice.
    pub fn as_slice(&self) -> &[Transaction] {
        &self.rows
    }

    /// First and last document date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|t| t.document_date).min()?;
        let last = self.rows.iter().map(|t| t.document_date).max()?;
        Some((first, last))
    }

    /// Distinct store identifiers, sorted.
    pub fn stores(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|t| t.store_id.as_str()).collect()
    }

    /// Distinct product families, sorted.
    pub fn families(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|t| t.product_family.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TransactionTable {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<Transaction> for TransactionTable {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name)?;
    let text = column.cast(&DataType::String)?;
    let values = text.str()?;
    Ok(values
        .into_iter()
        .map(|v| v.map(str::trim).unwrap_or_default().to_string())
        .collect())
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?;

    match column.dtype() {
        DataType::String => {
            let values = column.str()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, value)| parse_number(name, row, value))
                .collect()
        }
        DataType::Null => Ok(vec![0.0; column.len()]),
        dtype => {
            let numbers =
                column
                    .cast(&DataType::Float64)
                    .map_err(|_| DataError::UnsupportedType {
                        column: name.to_string(),
                        dtype: dtype.to_string(),
                    })?;
            Ok(numbers
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect())
        }
    }
}

/// Parse a textual number; blanks read as zero, decimal commas are accepted.
fn parse_number(column: &str, row: usize, value: Option<&str>) -> Result<f64> {
    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .or_else(|_| raw.replace(',', ".").parse::<f64>())
        .map_err(|_| DataError::InvalidNumber {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })
}

fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let column = df.column(name)?;

    let text = match column.dtype() {
        DataType::String => column.clone(),
        DataType::Date => column.cast(&DataType::String)?,
        DataType::Datetime(_, _) => column.cast(&DataType::Date)?.cast(&DataType::String)?,
        dtype => {
            return Err(DataError::UnsupportedType {
                column: name.to_string(),
                dtype: dtype.to_string(),
            });
        }
    };

    text.str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .and_then(parse_document_date)
                .ok_or_else(|| DataError::UnparseableDate {
                    row,
                    value: value.unwrap_or_default().to_string(),
                })
        })
        .collect()
}
