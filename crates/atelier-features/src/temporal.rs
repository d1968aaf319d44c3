//! Calendar features
//!
//! Month and quarter are exposed both as plain integers and as points on the
//! unit circle, so December and January end up neighbours:
//!
//! month_sin = sin(2π · month / 12), month_cos = cos(2π · month / 12)
//! quarter_sin = sin(2π · quarter / 4), quarter_cos = cos(2π · quarter / 4)

use crate::month::Month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Calendar features of a month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Month of year, 1–12
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// Quarter, 1–4
    pub quarter: u32,
    /// sin(2π · month / 12)
    pub month_sin: f64,
    /// cos(2π · month / 12)
    pub month_cos: f64,
    /// sin(2π · quarter / 4)
    pub quarter_sin: f64,
    /// cos(2π · quarter / 4)
    pub quarter_cos: f64,
}

impl CalendarFeatures {
    /// Features of the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_month(Month::from_date(date))
    }

    /// Features of `month`.
    pub fn from_month(month: Month) -> Self {
        let m = f64::from(month.month());
        let q = f64::from(month.quarter());
        Self {
            month: month.month(),
            year: month.year(),
            quarter: month.quarter(),
            month_sin: (2.0 * PI * m / 12.0).sin(),
            month_cos: (2.0 * PI * m / 12.0).cos(),
            quarter_sin: (2.0 * PI * q / 4.0).sin(),
            quarter_cos: (2.0 * PI * q / 4.0).cos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2024, 1, 1, 1)]
    #[case(2024, 3, 31, 1)]
    #[case(2024, 4, 1, 2)]
    #[case(2024, 9, 15, 3)]
    #[case(2024, 12, 31, 4)]
    fn test_quarter(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] quarter: u32) {
        let features = CalendarFeatures::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(features.quarter, quarter);
        assert_eq!(features.month, m);
        assert_eq!(features.year, y);
    }

    #[test]
    fn test_cyclical_encoding() {
        let december = CalendarFeatures::from_month(Month::new(2024, 12).unwrap());
        assert_relative_eq!(december.month_sin, 0.0, epsilon = 1e-12);
        assert_relative_eq!(december.month_cos, 1.0, epsilon = 1e-12);
        assert_relative_eq!(december.quarter_sin, 0.0, epsilon = 1e-12);
        assert_relative_eq!(december.quarter_cos, 1.0, epsilon = 1e-12);

        let march = CalendarFeatures::from_month(Month::new(2024, 3).unwrap());
        assert_relative_eq!(march.month_sin, 1.0, epsilon = 1e-12);
        assert_relative_eq!(march.month_cos, 0.0, epsilon = 1e-12);
        assert_relative_eq!(march.quarter_sin, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_points_on_unit_circle() {
        for m in 1..=12 {
            let f = CalendarFeatures::from_month(Month::new(2025, m).unwrap());
            assert_relative_eq!(f.month_sin.powi(2) + f.month_cos.powi(2), 1.0, epsilon = 1e-12);
            assert_relative_eq!(
                f.quarter_sin.powi(2) + f.quarter_cos.powi(2),
                1.0,
                epsilon = 1e-12
            );
        }
    }
}
