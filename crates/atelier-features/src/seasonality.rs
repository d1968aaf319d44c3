//! Family seasonality index
//!
//! For a family and a month M, the trailing window is the 12 months before M
//! (M itself excluded). Over that window:
//!
//! summer = demand in Mar–Aug months / total demand
//! winter = demand in Sep–Feb months / total demand
//!
//! Demand counts both targets across every store and size of the family.
//! Both shares are 0 when the family sold nothing in the window.

use crate::month::Month;
use crate::season::SeasonType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trailing months read by the index.
pub const SEASONALITY_WINDOW: i32 = 12;

/// Summer and Winter demand shares of a family.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonalityIndex {
    /// Share of trailing demand sold in Summer months
    pub summer: f64,
    /// Share of trailing demand sold in Winter months
    pub winter: f64,
}

/// Monthly demand totals per family.
#[derive(Debug, Clone, Default)]
pub struct FamilyDemand {
    by_family: BTreeMap<String, BTreeMap<Month, f64>>,
}

impl FamilyDemand {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `family` demand in `month`. Non-positive and
    /// non-finite quantities are ignored.
    pub fn add(&mut self, family: &str, month: Month, quantity: f64) {
        if !(quantity.is_finite() && quantity > 0.0) {
            return;
        }
        *self
            .by_family
            .entry(family.to_string())
            .or_default()
            .entry(month)
            .or_insert(0.0) += quantity;
    }

    /// Index for `family` at `month`, reading only earlier months.
    pub fn index(&self, family: &str, month: Month) -> SeasonalityIndex {
        let Some(months) = self.by_family.get(family) else {
            return SeasonalityIndex::default();
        };

        let start = month.add_months(-SEASONALITY_WINDOW);
        let (mut summer, mut total) = (0.0, 0.0);
        for (m, qty) in months.range(start..month) {
            total += qty;
            if SeasonType::of_month(*m) == SeasonType::Summer {
                summer += qty;
            }
        }

        if total > 0.0 {
            SeasonalityIndex {
                summer: summer / total,
                winter: (total - summer) / total,
            }
        } else {
            SeasonalityIndex::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    #[test]
    fn test_shares_over_trailing_year() {
        let mut demand = FamilyDemand::new();
        demand.add("Vestidos", m(2024, 6), 30.0);
        demand.add("Vestidos", m(2024, 11), 10.0);

        let index = demand.index("Vestidos", m(2025, 1));
        assert_relative_eq!(index.summer, 0.75);
        assert_relative_eq!(index.winter, 0.25);
    }

    #[test]
    fn test_current_and_later_months_are_excluded() {
        let mut demand = FamilyDemand::new();
        demand.add("Abrigos", m(2025, 1), 100.0);
        demand.add("Abrigos", m(2025, 5), 100.0);

        assert_eq!(demand.index("Abrigos", m(2025, 1)), SeasonalityIndex::default());
    }

    #[test]
    fn test_window_is_twelve_months() {
        let mut demand = FamilyDemand::new();
        demand.add("Abrigos", m(2024, 1), 50.0);
        demand.add("Abrigos", m(2024, 7), 50.0);

        let index = demand.index("Abrigos", m(2025, 1));
        assert_relative_eq!(index.summer, 1.0);
        assert_relative_eq!(index.winter, 0.0);
    }

    #[test]
    fn test_unknown_family_and_negatives() {
        let mut demand = FamilyDemand::new();
        demand.add("Faldas", m(2024, 6), -5.0);
        assert_eq!(demand.index("Faldas", m(2024, 9)), SeasonalityIndex::default());
        assert_eq!(demand.index("Otros", m(2024, 9)), SeasonalityIndex::default());
    }
}
