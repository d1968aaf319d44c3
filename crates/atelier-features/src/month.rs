//! Calendar month value type.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month (`YYYY-MM`), ordered chronologically.
///
/// Serialized as its `YYYY-MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month, returning `None` unless `month` is in `1..=12`.
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Rebuild a month from [`Month::index`].
    pub const fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, 1–12.
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Quarter of year, 1–4.
    pub const fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }

    /// Months since year 0, used as a contiguous period index.
    pub const fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    /// Month `n` months later (earlier when negative).
    pub const fn add_months(self, n: i32) -> Self {
        Self::from_index(self.index() + n)
    }

    /// Following month.
    pub const fn succ(self) -> Self {
        self.add_months(1)
    }

    /// Preceding month.
    pub const fn pred(self) -> Self {
        self.add_months(-1)
    }

    /// Number of months from `self` to `other`.
    pub const fn months_until(self, other: Self) -> i32 {
        other.index() - self.index()
    }

    /// Inclusive range of months from `self` to `end`.
    pub fn range_inclusive(self, end: Self) -> impl Iterator<Item = Self> {
        (self.index()..=end.index()).map(Self::from_index)
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.succ()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error parsing a `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid month {0:?}, expected YYYY-MM")]
pub struct ParseMonthError(String);

impl TryFrom<String> for Month {
    type Error = ParseMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        let m = Month::new(2024, 12).unwrap();
        assert_eq!(Month::from_index(m.index()), m);
        assert_eq!(m.succ(), Month::new(2025, 1).unwrap());
        assert_eq!(Month::new(2025, 1).unwrap().pred(), m);
        assert_eq!(m.add_months(-12), Month::new(2023, 12).unwrap());
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(Month::new(2024, 0).is_none());
        assert!(Month::new(2024, 13).is_none());
    }

    #[test]
    fn test_quarter() {
        let quarters: Vec<u32> = (1..=12)
            .map(|m| Month::new(2024, m).unwrap().quarter())
            .collect();
        assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn test_days() {
        let feb_leap = Month::new(2024, 2).unwrap();
        assert_eq!(
            feb_leap.last_day(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let feb = Month::new(2025, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn test_display_and_parse() {
        let m: Month = "2025-06".parse().unwrap();
        assert_eq!(m, Month::new(2025, 6).unwrap());
        assert_eq!(m.to_string(), "2025-06");
        assert!("2025/06".parse::<Month>().is_err());
        assert!("2025-13".parse::<Month>().is_err());
    }

    #[test]
    fn test_range_inclusive() {
        let start = Month::new(2024, 11).unwrap();
        let end = Month::new(2025, 2).unwrap();
        let months: Vec<String> = start.range_inclusive(end).map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
        assert_eq!(start.months_until(end), 3);
    }
}
