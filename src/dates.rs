//! Date input at the API boundary.
//!
//! Reports accept ISO `YYYY-MM-DD` and the clinic display format
//! `DD/MM/YYYY`. Both are parsed strictly into `NaiveDate`; everything
//! downstream works on `NaiveDate` only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ISO_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Empty date")]
    Empty,

    #[error("Unrecognized date '{0}'. Use YYYY-MM-DD or DD/MM/YYYY")]
    Unrecognized(String),

    #[error("Invalid reporting window: start {start} is after end {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`. Day/month values are validated
/// (no `31/02/2025`), and the year must have four digits.
pub fn parse_input_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Empty);
    }

    let format = if trimmed.contains('/') {
        DISPLAY_FORMAT
    } else {
        ISO_FORMAT
    };

    let year_len = if format == DISPLAY_FORMAT {
        trimmed.rsplit('/').next().map(str::len)
    } else {
        trimmed.split('-').next().map(str::len)
    };
    if year_len != Some(4) {
        return Err(DateParseError::Unrecognized(trimmed.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, format)
        .map_err(|_| DateParseError::Unrecognized(trimmed.to_string()))
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Inclusive reporting window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateParseError> {
        if start > end {
            return Err(DateParseError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateParseError> {
        Self::new(parse_input_date(start)?, parse_input_date(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Start moved back by `days`, for scheduled-date tolerance. Clamps to
    /// the earliest representable date instead of overflowing.
    pub fn start_minus_days(&self, days: i64) -> NaiveDate {
        chrono::Duration::try_days(days)
            .and_then(|delta| self.start.checked_sub_signed(delta))
            .unwrap_or(NaiveDate::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso() {
        assert_eq!(parse_input_date("2025-01-15").unwrap(), date(2025, 1, 15));
    }

    #[test]
    fn parses_display_day_first() {
        assert_eq!(parse_input_date("05/03/2025").unwrap(), date(2025, 3, 5));
        assert_eq!(parse_input_date(" 15/01/2025 ").unwrap(), date(2025, 1, 15));
    }

    #[test]
    fn rejects_month_first_layout() {
        // 13 is not a valid month, so a US-style date fails instead of
        // silently swapping fields.
        assert!(matches!(
            parse_input_date("01/13/2025"),
            Err(DateParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn rejects_impossible_days() {
        assert!(parse_input_date("31/02/2025").is_err());
        assert!(parse_input_date("2025-02-30").is_err());
    }

    #[test]
    fn rejects_two_digit_years() {
        assert!(parse_input_date("15/01/25").is_err());
        assert!(parse_input_date("25-01-15").is_err());
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_input_date("  "), Err(DateParseError::Empty));
        assert!(parse_input_date("tomorrow").is_err());
    }

    #[test]
    fn display_format_round_trips() {
        let d = date(2025, 3, 5);
        assert_eq!(format_display_date(d), "05/03/2025");
        assert_eq!(parse_input_date(&format_display_date(d)).unwrap(), d);
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        let err = ReportWindow::new(date(2025, 2, 1), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, DateParseError::InvertedWindow { .. }));
    }

    #[test]
    fn window_contains_is_inclusive() {
        let window = ReportWindow::parse("2025-01-01", "31/01/2025").unwrap();
        assert!(window.contains(date(2025, 1, 1)));
        assert!(window.contains(date(2025, 1, 31)));
        assert!(!window.contains(date(2025, 2, 1)));
        assert_eq!(window.start_minus_days(90), date(2024, 10, 3));
    }

    #[test]
    fn huge_lookback_clamps_instead_of_overflowing() {
        let window = ReportWindow::parse("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(window.start_minus_days(100_000_000), NaiveDate::MIN);
        assert_eq!(window.start_minus_days(i64::MAX), NaiveDate::MIN);
    }
}
