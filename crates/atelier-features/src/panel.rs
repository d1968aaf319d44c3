//! Monthly Panel Builder
//!
//! Aggregates transactions into one row per (store, family, size, month):
//!
//! - qty_in_season: positive quantity sold inside its campaign window
//! - qty_out_of_season: positive quantity sold outside it
//! - qty_returned: absolute quantity of returns (excluded from both targets)
//! - qty_net: signed sum of every line
//!
//! Each entity covers every month from its first sale to the last month of
//! the table, with zero demand where nothing was sold, and is extended by
//! `horizon` future months whose targets are unknown.

use crate::error::{FeatureError, Result};
use crate::lags::{LagSpec, TargetHistory, series_history};
use crate::margin::{MarginAccumulator, MarginFeatures, MarkdownCalendar};
use crate::month::Month;
use crate::season::{SeasonCalendar, SeasonType};
use crate::seasonality::{FamilyDemand, SeasonalityIndex};
use crate::target::Target;
use crate::temporal::CalendarFeatures;
use atelier_data::{DataError, TransactionTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Largest supported forecast horizon in months.
pub const MAX_HORIZON: u32 = 12;

/// A (store, family, size) series key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    /// Store identifier
    pub store: String,
    /// Product family
    pub family: String,
    /// Size
    pub size: String,
}

impl EntityKey {
    /// Create a key.
    pub fn new(store: impl Into<String>, family: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            family: family.into(),
            size: size.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.store, self.family, self.size)
    }
}

/// One panel row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    /// Series key
    pub entity: EntityKey,
    /// Calendar month
    pub month: Month,
    /// Synthetic month beyond the last observed one
    pub is_future: bool,
    /// In-season demand, `None` on future rows
    pub qty_in_season: Option<f64>,
    /// Out-of-season demand, `None` on future rows
    pub qty_out_of_season: Option<f64>,
    /// Returned units, `None` on future rows
    pub qty_returned: Option<f64>,
    /// Signed net units, `None` on future rows
    pub qty_net: Option<f64>,
    /// Forecast of in-season demand
    pub pred_qty_in_season: Option<f64>,
    /// Forecast of out-of-season demand
    pub pred_qty_out_of_season: Option<f64>,
    /// Calendar features of the month
    pub calendar: CalendarFeatures,
    /// Campaign season the month belongs to
    pub season: SeasonType,
    /// Margin and markdown features
    pub margin: MarginFeatures,
    /// Lag/rolling features of in-season demand
    pub in_season_history: TargetHistory,
    /// Lag/rolling features of out-of-season demand
    pub out_of_season_history: TargetHistory,
    /// Trailing family seasonality
    pub seasonality: SeasonalityIndex,
    /// Number of transaction lines in the cell
    pub transactions: usize,
}

impl PanelRow {
    /// Actual demand for `target`.
    pub const fn actual(&self, target: Target) -> Option<f64> {
        match target {
            Target::InSeason => self.qty_in_season,
            Target::OutOfSeason => self.qty_out_of_season,
        }
    }

    /// Predicted demand for `target`.
    pub const fn prediction(&self, target: Target) -> Option<f64> {
        match target {
            Target::InSeason => self.pred_qty_in_season,
            Target::OutOfSeason => self.pred_qty_out_of_season,
        }
    }

    /// Demand used by later rows' features: the actual, else the prediction.
    pub fn available(&self, target: Target) -> Option<f64> {
        self.actual(target).or_else(|| self.prediction(target))
    }

    /// Lag/rolling features for `target`.
    pub const fn history(&self, target: Target) -> &TargetHistory {
        match target {
            Target::InSeason => &self.in_season_history,
            Target::OutOfSeason => &self.out_of_season_history,
        }
    }

    const fn history_mut(&mut self, target: Target) -> &mut TargetHistory {
        match target {
            Target::InSeason => &mut self.in_season_history,
            Target::OutOfSeason => &mut self.out_of_season_history,
        }
    }

    const fn prediction_mut(&mut self, target: Target) -> &mut Option<f64> {
        match target {
            Target::InSeason => &mut self.pred_qty_in_season,
            Target::OutOfSeason => &mut self.pred_qty_out_of_season,
        }
    }
}

/// Panel builder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Campaign windows
    pub season_calendar: SeasonCalendar,
    /// Lag depths and rolling window
    pub lag_spec: LagSpec,
    /// Markdown months
    pub markdown: MarkdownCalendar,
}

impl PanelConfig {
    /// Check configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.lag_spec.validate()?;
        if !self.markdown.is_valid() {
            return Err(FeatureError::InvalidConfig(format!(
                "markdown months must lie in 1..=12, got {:?}",
                self.markdown.months
            )));
        }
        Ok(())
    }
}

/// Aggregated figures of one (entity, month) cell.
#[derive(Debug, Default)]
struct Cell {
    in_season: f64,
    out_of_season: f64,
    returned: f64,
    net: f64,
    margin: MarginAccumulator,
    transactions: usize,
}

/// Builds a [`MonthlyPanel`] from transactions.
#[derive(Debug, Clone, Default)]
pub struct PanelBuilder {
    config: PanelConfig,
}

impl PanelBuilder {
    /// Create a builder.
    pub const fn new(config: PanelConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Build the panel with `horizon` future months per entity (0 to 12).
    pub fn build(&self, table: &TransactionTable, horizon: u32) -> Result<MonthlyPanel> {
        if horizon > MAX_HORIZON {
            return Err(FeatureError::InvalidHorizon {
                horizon,
                max: MAX_HORIZON,
            });
        }
        self.config.validate()?;
        if table.is_empty() {
            return Err(DataError::Empty.into());
        }

        let calendar = &self.config.season_calendar;
        let mut cells: BTreeMap<EntityKey, BTreeMap<Month, Cell>> = BTreeMap::new();
        let mut in_season_lines = 0usize;

        for t in table {
            let key = EntityKey::new(&t.store_id, &t.product_family, &t.size);
            let cell = cells
                .entry(key)
                .or_default()
                .entry(Month::from_date(t.document_date))
                .or_default();

            let qty = t.signed_quantity;
            if qty > 0.0 {
                if calendar.classify(&t.season_label, t.document_date).in_season {
                    cell.in_season += qty;
                    in_season_lines += 1;
                } else {
                    cell.out_of_season += qty;
                }
            } else if qty < 0.0 {
                cell.returned -= qty;
            }
            cell.net += qty;
            cell.margin.push(t);
            cell.transactions += 1;
        }

        let last_historical = cells
            .values()
            .filter_map(|months| months.keys().next_back())
            .max()
            .copied()
            .ok_or(DataError::Empty)?;

        let mut rows = Vec::new();
        for (entity, months) in &cells {
            let Some(first) = months.keys().next().copied() else {
                continue;
            };
            let mut margin = MarginFeatures::default();
            let last_future = last_historical.add_months(horizon as i32);

            for month in first.range_inclusive(last_future) {
                let is_future = month > last_historical;
                let cell = months.get(&month);
                if let Some(features) = cell.and_then(|c| c.margin.finish()) {
                    margin = features;
                }

                let figure = |f: fn(&Cell) -> f64| {
                    if is_future {
                        None
                    } else {
                        Some(cell.map_or(0.0, f))
                    }
                };

                rows.push(PanelRow {
                    entity: entity.clone(),
                    month,
                    is_future,
                    qty_in_season: figure(|c| c.in_season),
                    qty_out_of_season: figure(|c| c.out_of_season),
                    qty_returned: figure(|c| c.returned),
                    qty_net: figure(|c| c.net),
                    pred_qty_in_season: None,
                    pred_qty_out_of_season: None,
                    calendar: CalendarFeatures::from_month(month),
                    season: SeasonType::of_month(month),
                    margin: MarginFeatures {
                        is_markdown_period: self.config.markdown.is_markdown(month),
                        ..margin
                    },
                    in_season_history: TargetHistory::default(),
                    out_of_season_history: TargetHistory::default(),
                    seasonality: SeasonalityIndex::default(),
                    transactions: cell.map_or(0, |c| c.transactions),
                });
            }
        }

        let mut panel = MonthlyPanel {
            rows,
            last_historical,
            horizon,
            config: self.config.clone(),
        };
        panel.refresh_features();

        info!(
            entities = cells.len(),
            rows = panel.len(),
            last_month = %last_historical,
            horizon,
            "Built monthly panel"
        );
        debug!(
            transactions = table.len(),
            in_season_lines, "Classified transaction lines"
        );

        Ok(panel)
    }
}

/// Gap-filled monthly panel with history features.
///
/// Rows are sorted by entity then month and every (entity, month) pair
/// appears once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPanel {
    rows: Vec<PanelRow>,
    last_historical: Month,
    horizon: u32,
    config: PanelConfig,
}

impl MonthlyPanel {
    /// All rows.
    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, PanelRow> {
        self.rows.iter()
    }

    /// Rows with observed demand.
    pub fn historical_rows(&self) -> impl Iterator<Item = &PanelRow> {
        self.rows.iter().filter(|r| !r.is_future)
    }

    /// Synthetic future rows.
    pub fn future_rows(&self) -> impl Iterator<Item = &PanelRow> {
        self.rows.iter().filter(|r| r.is_future)
    }

    /// Last month with observed transactions.
    pub const fn last_historical_month(&self) -> Month {
        self.last_historical
    }

    /// Number of future months per entity.
    pub const fn horizon(&self) -> u32 {
        self.horizon
    }

    /// Configuration the panel was built with.
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Lag depths and rolling window.
    pub const fn lag_spec(&self) -> &LagSpec {
        &self.config.lag_spec
    }

    /// Future months in chronological order.
    pub fn future_months(&self) -> Vec<Month> {
        (1..=self.horizon as i32)
            .map(|n| self.last_historical.add_months(n))
            .collect()
    }

    /// Distinct entities in key order.
    pub fn entities(&self) -> Vec<&EntityKey> {
        self.series().map(|s| &s[0].entity).collect()
    }

    /// Per-entity series, each ordered by month.
    pub fn series(&self) -> impl Iterator<Item = &[PanelRow]> {
        self.rows.chunk_by(|a, b| a.entity == b.entity)
    }

    fn position(&self, entity: &EntityKey, month: Month) -> Option<usize> {
        self.rows
            .binary_search_by(|r| (&r.entity, r.month).cmp(&(entity, month)))
            .ok()
    }

    /// Row for `entity` at `month`.
    pub fn get(&self, entity: &EntityKey, month: Month) -> Option<&PanelRow> {
        self.position(entity, month).map(|i| &self.rows[i])
    }

    /// Largest observed demand of `entity` for `target`, 0 when unknown.
    pub fn historical_max(&self, entity: &EntityKey, target: Target) -> f64 {
        self.historical_rows()
            .filter(|r| &r.entity == entity)
            .filter_map(|r| r.actual(target))
            .fold(0.0, f64::max)
    }

    /// Write a prediction onto a row. Returns `false` when no such row exists.
    ///
    /// Call [`MonthlyPanel::refresh_features`] afterwards so later rows see it.
    pub fn set_prediction(
        &mut self,
        entity: &EntityKey,
        month: Month,
        target: Target,
        value: f64,
    ) -> bool {
        match self.position(entity, month) {
            Some(i) => {
                *self.rows[i].prediction_mut(target) = Some(value);
                true
            }
            None => false,
        }
    }

    /// Recompute lag, rolling and seasonality features from the current
    /// actuals and predictions.
    pub fn refresh_features(&mut self) {
        let spec = self.config.lag_spec.clone();
        for series in self.rows.chunk_by_mut(|a, b| a.entity == b.entity) {
            for target in Target::all() {
                let values: Vec<Option<f64>> =
                    series.iter().map(|r| r.available(target)).collect();
                for (row, history) in series.iter_mut().zip(series_history(&values, &spec)) {
                    *row.history_mut(target) = history;
                }
            }
        }

        let mut demand = FamilyDemand::new();
        for row in &self.rows {
            for target in Target::all() {
                if let Some(qty) = row.available(target) {
                    demand.add(&row.entity.family, row.month, qty);
                }
            }
        }
        for row in &mut self.rows {
            row.seasonality = demand.index(&row.entity.family, row.month);
        }
    }
}

impl<'a> IntoIterator for &'a MonthlyPanel {
    type Item = &'a PanelRow;
    type IntoIter = std::slice::Iter<'a, PanelRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
