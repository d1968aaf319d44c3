//! Season Classifier
//!
//! Every product belongs to a seasonal campaign encoded in its season label:
//! a season code (`I` for Winter, `V` for Summer) followed by the campaign
//! year in two or four digits (`I25`, `V2024`).
//!
//! Campaign windows, both bounds inclusive:
//! - Winter(Y): Sep 1 of Y-1 to the last day of Feb of Y
//! - Summer(Y): Mar 1 of Y to Aug 31 of Y
//!
//! A label that does not parse classifies the sale as out-of-season.

use crate::month::Month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seasonal campaign type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    /// Autumn/Winter campaign (`I`, invierno)
    Winter,
    /// Spring/Summer campaign (`V`, verano)
    Summer,
}

impl SeasonType {
    /// Label code.
    pub const fn code(&self) -> char {
        match self {
            Self::Winter => 'I',
            Self::Summer => 'V',
        }
    }

    /// Parse a label code.
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'I' => Some(Self::Winter),
            'V' => Some(Self::Summer),
            _ => None,
        }
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Summer => "Summer",
        }
    }

    /// Campaign whose default window covers `month` (Mar–Aug Summer, Sep–Feb Winter).
    pub const fn of_month(month: Month) -> Self {
        match month.month() {
            3..=8 => Self::Summer,
            _ => Self::Winter,
        }
    }

    /// Both season types.
    pub const fn all() -> [Self; 2] {
        [Self::Winter, Self::Summer]
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete campaign: type and campaign year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonWindow {
    /// Campaign type
    pub season_type: SeasonType,
    /// Campaign year (the year the window ends in)
    pub year: i32,
}

impl SeasonWindow {
    /// Create a window.
    pub const fn new(season_type: SeasonType, year: i32) -> Self {
        Self { season_type, year }
    }

    /// First day of the window under the default calendar.
    pub fn start(&self) -> NaiveDate {
        SeasonCalendar::default().bounds(*self).0
    }

    /// Last day of the window under the default calendar.
    pub fn end(&self) -> NaiveDate {
        SeasonCalendar::default().bounds(*self).1
    }

    /// Whether `date` falls inside the window (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        SeasonCalendar::default().contains(*self, date)
    }

    /// Canonical four-digit label, e.g. `I2025`.
    pub fn label(&self) -> String {
        format!("{}{:04}", self.season_type.code(), self.year)
    }
}

/// Parse a season label into its campaign window.
///
/// Accepts a season code followed by exactly two (`I25` → 2025) or four
/// (`I2025`) ASCII digits, surrounding whitespace ignored.
pub fn parse_season_label(label: &str) -> Option<SeasonWindow> {
    let label = label.trim();
    let mut chars = label.chars();
    let season_type = SeasonType::from_code(chars.next()?)?;
    let digits = chars.as_str();

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = match digits.len() {
        2 => 2000 + digits.parse::<i32>().ok()?,
        4 => digits.parse::<i32>().ok()?,
        _ => return None,
    };

    Some(SeasonWindow::new(season_type, year))
}

/// Bounds of one campaign type relative to its campaign year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBounds {
    /// Month the window opens
    pub start_month: u32,
    /// Year offset of the opening month relative to the campaign year
    pub start_year_offset: i32,
    /// Month the window closes (on its last day), in the campaign year
    pub end_month: u32,
}

/// Table of campaign windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCalendar {
    /// Winter bounds (default Sep of Y-1 to Feb of Y)
    pub winter: SeasonBounds,
    /// Summer bounds (default Mar to Aug of Y)
    pub summer: SeasonBounds,
}

impl Default for SeasonCalendar {
    fn default() -> Self {
        Self {
            winter: SeasonBounds {
                start_month: 9,
                start_year_offset: -1,
                end_month: 2,
            },
            summer: SeasonBounds {
                start_month: 3,
                start_year_offset: 0,
                end_month: 8,
            },
        }
    }
}

/// Result of classifying one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonClassification {
    /// Parsed campaign, `None` when the label is unusable
    pub window: Option<SeasonWindow>,
    /// Whether the sale happened inside its campaign window
    pub in_season: bool,
}

impl SeasonCalendar {
    /// Bounds for a season type.
    pub const fn bounds_for(&self, season_type: SeasonType) -> SeasonBounds {
        match season_type {
            SeasonType::Winter => self.winter,
            SeasonType::Summer => self.summer,
        }
    }

    /// Inclusive first and last day of `window`.
    pub fn bounds(&self, window: SeasonWindow) -> (NaiveDate, NaiveDate) {
        let b = self.bounds_for(window.season_type);
        let start = Month::new(window.year + b.start_year_offset, b.start_month)
            .map(|m| m.first_day())
            .unwrap_or_default();
        let end = Month::new(window.year, b.end_month)
            .map(|m| m.last_day())
            .unwrap_or_default();
        (start, end)
    }

    /// Whether `date` falls inside `window` (inclusive).
    pub fn contains(&self, window: SeasonWindow, date: NaiveDate) -> bool {
        let (start, end) = self.bounds(window);
        start <= date && date <= end
    }

    /// Classify a sale by its season label and date.
    pub fn classify(&self, label: &str, date: NaiveDate) -> SeasonClassification {
        let window = parse_season_label(label);
        SeasonClassification {
            window,
            in_season: window.is_some_and(|w| self.contains(w, date)),
        }
    }
}

/// Classify a sale under the default calendar.
pub fn classify(label: &str, date: NaiveDate) -> SeasonClassification {
    SeasonCalendar::default().classify(label, date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("I25", date(2024, 12, 15), true)]
    #[case("I25", date(2025, 3, 15), false)]
    #[case("I25", date(2024, 9, 1), true)]
    #[case("I25", date(2024, 8, 31), false)]
    #[case("I25", date(2025, 2, 28), true)]
    #[case("I24", date(2024, 2, 29), true)]
    #[case("I2025", date(2025, 1, 10), true)]
    #[case("V24", date(2024, 3, 1), true)]
    #[case("V24", date(2024, 8, 31), true)]
    #[case("V24", date(2024, 9, 1), false)]
    #[case("V2024", date(2025, 6, 1), false)]
    #[case(" V24 ", date(2024, 6, 1), true)]
    fn test_classify(#[case] label: &str, #[case] sold: NaiveDate, #[case] expected: bool) {
        let result = classify(label, sold);
        assert!(result.window.is_some());
        assert_eq!(result.in_season, expected, "{label} on {sold}");
    }

    #[rstest]
    #[case("")]
    #[case("I")]
    #[case("X25")]
    #[case("I2A")]
    #[case("I202")]
    #[case("i25")]
    #[case("Sin Temporada")]
    #[case("V-25")]
    fn test_unparseable_labels_are_out_of_season(#[case] label: &str) {
        let result = classify(label, date(2024, 12, 15));
        assert_eq!(result.window, None);
        assert!(!result.in_season);
    }

    #[test]
    fn test_window_bounds() {
        let winter = SeasonWindow::new(SeasonType::Winter, 2025);
        assert_eq!(winter.start(), date(2024, 9, 1));
        assert_eq!(winter.end(), date(2025, 2, 28));

        let leap_winter = SeasonWindow::new(SeasonType::Winter, 2024);
        assert_eq!(leap_winter.end(), date(2024, 2, 29));

        let summer = SeasonWindow::new(SeasonType::Summer, 2025);
        assert_eq!(summer.start(), date(2025, 3, 1));
        assert_eq!(summer.end(), date(2025, 8, 31));
        assert_eq!(summer.label(), "V2025");
    }

    #[test]
    fn test_season_of_month() {
        let seasons: Vec<SeasonType> = (1..=12)
            .map(|m| SeasonType::of_month(Month::new(2025, m).unwrap()))
            .collect();
        let summer_months = seasons.iter().filter(|s| **s == SeasonType::Summer).count();
        assert_eq!(summer_months, 6);
        assert_eq!(seasons[0], SeasonType::Winter);
        assert_eq!(seasons[2], SeasonType::Summer);
        assert_eq!(seasons[8], SeasonType::Winter);
    }

    #[test]
    fn test_custom_calendar() {
        let mut calendar = SeasonCalendar::default();
        calendar.summer.end_month = 7;
        let window = SeasonWindow::new(SeasonType::Summer, 2024);
        assert!(!calendar.contains(window, date(2024, 8, 10)));
        assert!(window.contains(date(2024, 8, 10)));
    }
}
