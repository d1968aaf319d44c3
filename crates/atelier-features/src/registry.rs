//! Feature Registry
//!
//! Metadata for every model feature the panel exposes, in the order the
//! forecasting models consume them.

use crate::frame;
use crate::lags::LagSpec;
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Feature categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    /// Store, family and size identifiers
    Entity,
    /// Month, year, quarter and cyclical encodings
    Calendar,
    /// Campaign season and family seasonality
    Season,
    /// Margin, price and markdown
    Margin,
    /// Lagged and rolling demand
    History,
}

/// How a model should read a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Ordered numeric value
    Numeric,
    /// Unordered category
    Categorical,
}

/// Feature metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    /// Column name (unique identifier)
    pub name: String,
    /// Feature category
    pub category: FeatureCategory,
    /// Numeric or categorical
    pub kind: FeatureKind,
    /// Brief description
    pub description: String,
}

impl FeatureInfo {
    fn new(
        name: impl Into<String>,
        category: FeatureCategory,
        kind: FeatureKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind,
            description: description.into(),
        }
    }

    /// Whether the feature is categorical.
    pub fn is_categorical(&self) -> bool {
        self.kind == FeatureKind::Categorical
    }
}

/// Features shared by both targets.
pub fn base_features() -> Vec<FeatureInfo> {
    use FeatureCategory::*;
    use FeatureKind::*;

    vec![
        // Calendar
        FeatureInfo::new(frame::MONTH, Calendar, Numeric, "Month of year (1-12)"),
        FeatureInfo::new(frame::YEAR, Calendar, Numeric, "Calendar year"),
        FeatureInfo::new(frame::MONTH_SIN, Calendar, Numeric, "sin(2π·month/12)"),
        FeatureInfo::new(frame::MONTH_COS, Calendar, Numeric, "cos(2π·month/12)"),
        FeatureInfo::new(frame::QUARTER_SIN, Calendar, Numeric, "sin(2π·quarter/4)"),
        FeatureInfo::new(frame::QUARTER_COS, Calendar, Numeric, "cos(2π·quarter/4)"),
        FeatureInfo::new(frame::QUARTER, Calendar, Categorical, "Quarter of year"),
        // Margin
        FeatureInfo::new(
            frame::UNIT_MARGIN,
            Margin,
            Numeric,
            "Mean list price minus unit cost",
        ),
        FeatureInfo::new(
            frame::RELATIVE_PRICE,
            Margin,
            Numeric,
            "Unit margin as a share of list price",
        ),
        FeatureInfo::new(
            frame::IS_MARKDOWN_PERIOD,
            Margin,
            Numeric,
            "Month falls in a markdown wave",
        ),
        // Season
        FeatureInfo::new(
            frame::SEASONALITY_SUMMER,
            Season,
            Numeric,
            "Trailing 12-month Summer share of family demand",
        ),
        FeatureInfo::new(
            frame::SEASONALITY_WINTER,
            Season,
            Numeric,
            "Trailing 12-month Winter share of family demand",
        ),
        // Entity
        FeatureInfo::new(frame::STORE, Entity, Categorical, "Store identifier"),
        FeatureInfo::new(frame::FAMILY, Entity, Categorical, "Product family"),
        FeatureInfo::new(frame::SIZE, Entity, Categorical, "Size"),
    ]
}

/// Lag and rolling features of `target`.
pub fn history_features(target: Target, spec: &LagSpec) -> Vec<FeatureInfo> {
    let mut features: Vec<FeatureInfo> = spec
        .lags
        .iter()
        .map(|&lag| {
            FeatureInfo::new(
                target.lag_column(lag),
                FeatureCategory::History,
                FeatureKind::Numeric,
                format!("{} demand {lag} month(s) earlier", target.label()),
            )
        })
        .collect();
    features.push(FeatureInfo::new(
        target.rolling_column(spec.rolling_window),
        FeatureCategory::History,
        FeatureKind::Numeric,
        format!(
            "Mean {} demand over the previous {} months",
            target.label(),
            spec.rolling_window
        ),
    ));
    features
}

/// The campaign season feature.
pub fn season_feature() -> FeatureInfo {
    FeatureInfo::new(
        frame::SEASON,
        FeatureCategory::Season,
        FeatureKind::Categorical,
        "Campaign season of the month (Summer or Winter)",
    )
}

/// Get all available feature info
pub fn available_features(spec: &LagSpec) -> Vec<FeatureInfo> {
    let mut features = base_features();
    features.push(season_feature());
    for target in Target::all() {
        features.extend(history_features(target, spec));
    }
    features
}

/// Get features by category
pub fn features_by_category(category: FeatureCategory, spec: &LagSpec) -> Vec<FeatureInfo> {
    available_features(spec)
        .into_iter()
        .filter(|f| f.category == category)
        .collect()
}

/// Get feature info by name
pub fn get_feature_info(name: &str, spec: &LagSpec) -> Option<FeatureInfo> {
    available_features(spec).into_iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelBuilder;
    use atelier_data::{Transaction, TransactionTable};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let features = available_features(&LagSpec::default());
        let names: HashSet<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names.len(), features.len());
        assert_eq!(features.len(), 16 + 8);
    }

    #[test]
    fn test_categorical_features() {
        let categorical: Vec<String> = available_features(&LagSpec::default())
            .into_iter()
            .filter(FeatureInfo::is_categorical)
            .map(|f| f.name)
            .collect();
        assert_eq!(categorical, vec!["quarter", "store", "family", "size", "season"]);
    }

    #[test]
    fn test_lookup() {
        let spec = LagSpec::default();
        let info = get_feature_info("lag_12_qty_out_of_season", &spec).unwrap();
        assert_eq!(info.category, FeatureCategory::History);
        assert!(get_feature_info("price_elasticity", &spec).is_none());
        assert_eq!(features_by_category(FeatureCategory::Entity, &spec).len(), 3);
    }

    #[test]
    fn test_every_feature_is_a_panel_column() {
        let table: TransactionTable = std::iter::once(Transaction {
            document_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            store_id: "T01".to_string(),
            product_id: String::new(),
            product_family: "Faldas".to_string(),
            size: "S".to_string(),
            signed_quantity: 1.0,
            subtotal: 30.0,
            list_price: 30.0,
            unit_cost: 12.0,
            season_label: "I25".to_string(),
        })
        .collect();
        let df = PanelBuilder::default()
            .build(&table, 1)
            .unwrap()
            .to_dataframe()
            .unwrap();

        for feature in available_features(&LagSpec::default()) {
            assert!(df.column(&feature.name).is_ok(), "{}", feature.name);
        }
    }
}
