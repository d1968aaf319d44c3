//! Headline sales figures of a transaction table.

use crate::transactions::TransactionTable;
use serde::{Deserialize, Serialize};

/// Aggregate unit and revenue figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    /// Units sold on positive lines
    pub gross_units: f64,
    /// Units returned (absolute value of negative lines)
    pub returned_units: f64,
    /// Gross minus returned units
    pub net_units: f64,
    /// Sum of line subtotals
    pub revenue: f64,
    /// Margin at list price over units sold: Σ (list_price − unit_cost) · qty
    pub list_margin: f64,
    /// Returned over gross units, 0 when nothing was sold
    pub return_rate: f64,
}

impl TransactionTable {
    /// Compute headline sales figures.
    pub fn summary(&self) -> SalesSummary {
        let mut summary = SalesSummary::default();

        for t in self {
            if t.signed_quantity > 0.0 {
                summary.gross_units += t.signed_quantity;
                summary.list_margin += (t.list_price - t.unit_cost) * t.signed_quantity;
            } else {
                summary.returned_units += -t.signed_quantity;
            }
            summary.revenue += t.subtotal;
        }

        summary.net_units = summary.gross_units - summary.returned_units;
        summary.return_rate = if summary.gross_units > 0.0 {
            summary.returned_units / summary.gross_units
        } else {
            0.0
        };
        summary
    }
}
