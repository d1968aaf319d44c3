//! Document date parsing.
//!
//! Spreadsheet exports carry day-first dates (`15/12/2024`); loaders that
//! already converted the column hand over ISO strings or polars dates.

use chrono::NaiveDate;

/// Accepted textual formats, tried in order.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a document date, ignoring any time-of-day suffix.
pub fn parse_document_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("15/12/2024", 2024, 12, 15)]
    #[case("2024-12-15", 2024, 12, 15)]
    #[case("15-12-2024", 2024, 12, 15)]
    #[case("2025-03-01 00:00:00", 2025, 3, 1)]
    #[case("2025-03-01T10:30:00", 2025, 3, 1)]
    #[case("  01/02/2023 ", 2023, 2, 1)]
    fn test_parse_valid(#[case] raw: &str, #[case] y: i32, #[case] m: u32, #[case] d: u32) {
        assert_eq!(
            parse_document_date(raw),
            Some(NaiveDate::from_ymd_opt(y, m, d).unwrap())
        );
    }

    #[rstest]
    #[case("")]
    #[case("not a date")]
    #[case("31/02/2024")]
    #[case("2024-13-01")]
    fn test_parse_invalid(#[case] raw: &str) {
        assert_eq!(parse_document_date(raw), None);
    }
}
