//! # Dates
//!
//! FRBR expressions and purposes use calendar dates (`%Y-%m-%d`), always
//! taken in UTC.

use chrono::{NaiveDate, Utc};

use crate::error::CoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Today's date in UTC, formatted `YYYY-MM-DD`.
pub fn today_str() -> String {
    format_date(today())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CoreError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_month_and_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_date(d), "2024-03-07");
    }

    #[test]
    fn parse_roundtrip() {
        let d = parse_date("2023-12-31").unwrap();
        assert_eq!(format_date(d), "2023-12-31");
    }

    #[test]
    fn parse_rejects_other_formats() {
        assert!(parse_date("31-12-2023").is_err());
        assert!(parse_date("2023-02-30").is_err());
    }

    #[test]
    fn today_str_has_date_shape() {
        let s = today_str();
        assert_eq!(s.len(), 10);
        assert!(parse_date(&s).is_ok());
    }
}
