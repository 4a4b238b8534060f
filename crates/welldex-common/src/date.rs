//! Date parsing for the handful of formats state regulatory feeds actually
//! use. Never panics or returns an `Err` a caller has to unwrap for a bad
//! row — an unparseable date is simply `None`, and the row continues
//! flowing through the pipeline with that field null.

use chrono::{Datelike, NaiveDate};

/// Parse a date in one of the accepted source formats:
/// `YYYYMMDD`, `MM/DD/YYYY`, `YYYY-MM-DD`, `YYYYMM` (assumed day 1).
/// Rejects all-zero inputs (`"0"`, `"00000000"`) and anything else that
/// doesn't parse, returning `None` rather than erroring.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_all_zero(trimmed) {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(d);
    }
    if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            return Some(d);
        }
    }
    if trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let with_day = format!("{trimmed}01");
        if let Ok(d) = NaiveDate::parse_from_str(&with_day, "%Y%m%d") {
            return Some(d);
        }
    }

    None
}

/// Normalize any date to the first of its month — the unit `ProductionRecord.month` is stored at.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day0(0).unwrap_or(date)
}

fn is_all_zero(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yyyymmdd() {
        assert_eq!(
            parse_flexible_date("20230115"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
    }

    #[test]
    fn parses_mm_dd_yyyy() {
        assert_eq!(
            parse_flexible_date("01/15/2023"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
    }

    #[test]
    fn parses_iso() {
        assert_eq!(
            parse_flexible_date("2023-01-15"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
    }

    #[test]
    fn parses_yyyymm_as_first_of_month() {
        assert_eq!(
            parse_flexible_date("202301"),
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
    }

    #[test]
    fn rejects_all_zero() {
        assert_eq!(parse_flexible_date("0"), None);
        assert_eq!(parse_flexible_date("00000000"), None);
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert_eq!(parse_flexible_date("not-a-date"), None);
        assert_eq!(parse_flexible_date(""), None);
    }

    #[test]
    fn first_of_month_normalizes() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 17).unwrap();
        assert_eq!(first_of_month(d), NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }
}
