use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{CohortError, Result};

/// Naive timestamp layouts accepted for invoice dates, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse an invoice timestamp.
///
/// Accepts RFC 3339 (offset discarded, wall-clock time kept), the ISO-like
/// naive layouts listed above, US-style `12/1/2010 8:26` as written by
/// spreadsheet exports, and bare `%Y-%m-%d` dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(CohortError::TimestampParse(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(CohortError::TimestampParse(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_rfc3339_keeps_wall_clock() {
        let ts = parse_timestamp("2010-12-01T08:26:00Z").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2010, 12, 1));
        assert_eq!((ts.hour(), ts.minute()), (8, 26));

        let offset = parse_timestamp("2010-12-31T23:30:00-05:00").unwrap();
        // Wall-clock month must not shift into January.
        assert_eq!((offset.year(), offset.month()), (2010, 12));
    }

    #[test]
    fn test_parse_timestamp_naive_iso() {
        let ts = parse_timestamp("2011-01-04 10:00:00").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2011, 1, 4));

        let no_secs = parse_timestamp("2011-01-04 10:00").unwrap();
        assert_eq!(no_secs, ts);
    }

    #[test]
    fn test_parse_timestamp_us_spreadsheet_layout() {
        let ts = parse_timestamp("12/1/2010 8:26").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2010, 12, 1));
        assert_eq!((ts.hour(), ts.minute()), (8, 26));
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let ts = parse_timestamp("2011-03-15").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2011, 3, 15));
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(CohortError::TimestampParse(_))
        ));
        assert!(parse_timestamp("").is_err());
    }
}
