//! Margin and markdown features.
//!
//! unit_margin = list_price − unit_cost
//! relative_price = unit_margin / list_price, 0 when the list price is 0

use crate::month::Month;
use atelier_data::Transaction;
use serde::{Deserialize, Serialize};

/// Unit margin at list price.
pub fn unit_margin(list_price: f64, unit_cost: f64) -> f64 {
    list_price - unit_cost
}

/// Margin as a share of list price; never divides by zero.
pub fn relative_price(list_price: f64, unit_cost: f64) -> f64 {
    if list_price == 0.0 {
        0.0
    } else {
        unit_margin(list_price, unit_cost) / list_price
    }
}

/// Months in which markdown waves run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownCalendar {
    /// Months of year (1–12), default January, February, June and July
    pub months: Vec<u32>,
}

impl Default for MarkdownCalendar {
    fn default() -> Self {
        Self {
            months: vec![1, 2, 6, 7],
        }
    }
}

impl MarkdownCalendar {
    /// Whether `month` falls in a markdown period.
    pub fn is_markdown(&self, month: Month) -> bool {
        self.months.contains(&month.month())
    }

    /// Whether every configured month is a valid month of year.
    pub fn is_valid(&self) -> bool {
        self.months.iter().all(|m| (1..=12).contains(m))
    }
}

/// Margin features of a panel cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarginFeatures {
    /// Mean unit margin
    pub unit_margin: f64,
    /// Mean relative price
    pub relative_price: f64,
    /// Mean list price
    pub avg_list_price: f64,
    /// Month lies in a markdown period
    pub is_markdown_period: bool,
}

/// Running means of transaction-level margin figures for one cell.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MarginAccumulator {
    unit_margin: f64,
    relative_price: f64,
    list_price: f64,
    lines: usize,
}

impl MarginAccumulator {
    pub(crate) fn push(&mut self, t: &Transaction) {
        self.unit_margin += unit_margin(t.list_price, t.unit_cost);
        self.relative_price += relative_price(t.list_price, t.unit_cost);
        self.list_price += t.list_price;
        self.lines += 1;
    }

    /// Cell means, `None` when the cell saw no lines.
    pub(crate) fn finish(&self) -> Option<MarginFeatures> {
        if self.lines == 0 {
            return None;
        }
        let n = self.lines as f64;
        Some(MarginFeatures {
            unit_margin: self.unit_margin / n,
            relative_price: self.relative_price / n,
            avg_list_price: self.list_price / n,
            is_markdown_period: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn line(list_price: f64, unit_cost: f64) -> Transaction {
        Transaction {
            document_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            store_id: "S".to_string(),
            product_id: String::new(),
            product_family: "F".to_string(),
            size: "M".to_string(),
            signed_quantity: 1.0,
            subtotal: list_price,
            list_price,
            unit_cost,
            season_label: "I25".to_string(),
        }
    }

    #[test]
    fn test_margins() {
        assert_relative_eq!(unit_margin(40.0, 15.0), 25.0);
        assert_relative_eq!(relative_price(40.0, 15.0), 0.625);
        assert_eq!(relative_price(0.0, 15.0), 0.0);
        assert!(relative_price(0.0, 0.0).is_finite());
    }

    #[test]
    fn test_markdown_calendar() {
        let calendar = MarkdownCalendar::default();
        let flags: Vec<bool> = (1..=12)
            .map(|m| calendar.is_markdown(Month::new(2025, m).unwrap()))
            .collect();
        assert_eq!(
            flags,
            vec![true, true, false, false, false, true, true, false, false, false, false, false]
        );
        assert!(calendar.is_valid());
        assert!(!MarkdownCalendar { months: vec![0, 13] }.is_valid());
    }

    #[test]
    fn test_accumulator_means() {
        let mut acc = MarginAccumulator::default();
        assert!(acc.finish().is_none());

        acc.push(&line(40.0, 20.0));
        acc.push(&line(20.0, 15.0));
        let features = acc.finish().unwrap();
        assert_relative_eq!(features.unit_margin, 12.5);
        assert_relative_eq!(features.relative_price, (0.5 + 0.25) / 2.0);
        assert_relative_eq!(features.avg_list_price, 30.0);
    }
}
