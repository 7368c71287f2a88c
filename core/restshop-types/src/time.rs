//! Timestamp parsing and formatting shared by the value model.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a timestamp in RFC 3339, naive ISO 8601 (read as UTC) or plain
/// date form.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(Error::InvalidTimestamp(raw.to_string()))
}

/// Formats a timestamp as RFC 3339 with a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_fraction() {
        let ts = parse_timestamp("2021-05-02T00:00:00.00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_as_utc() {
        let ts = parse_timestamp("2020-01-01 05:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn parses_plain_date() {
        let ts = parse_timestamp("2020-01-01").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn formats_with_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2021-05-02T00:00:00Z");
    }
}
