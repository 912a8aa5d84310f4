//! Parsing of user-supplied date-times.
//!
//! Input without an offset is wall-clock time in the session's zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CalendarError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Resolve an IANA zone label.
pub fn parse_time_zone(label: &str) -> Result<Tz, CalendarError> {
    label
        .parse::<Tz>()
        .map_err(|_| CalendarError::InvalidArgument(format!("unknown time zone '{}'", label)))
}

/// Parse `input` into an instant, reading offset-less values in `tz`.
pub fn parse_date_time(input: &str, tz: Tz) -> Result<DateTime<Utc>, CalendarError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| {
            CalendarError::InvalidArgument(format!("'{}' is not a date-time", input))
        })?;

    // Ambiguous wall-clock times (DST fall-back) take the first occurrence
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            CalendarError::InvalidArgument(format!("'{}' does not exist in {}", input, tz.name()))
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::error::ErrorKind;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_naive_is_wall_clock_in_zone() {
        let tz = chrono_tz::Europe::Amsterdam;
        assert_eq!(
            parse_date_time("2024-05-01T10:00:00", tz).unwrap(),
            utc("2024-05-01T08:00:00Z")
        );
        assert_eq!(
            parse_date_time("2024-01-15 09:30", tz).unwrap(),
            utc("2024-01-15T08:30:00Z")
        );
        assert_eq!(
            parse_date_time("2024/01/15 09:30:15", tz).unwrap(),
            utc("2024-01-15T08:30:15Z")
        );
    }

    #[test]
    fn test_explicit_offset_wins() {
        let tz = chrono_tz::Europe::Amsterdam;
        assert_eq!(
            parse_date_time("2024-05-01T10:00:00Z", tz).unwrap(),
            utc("2024-05-01T10:00:00Z")
        );
        assert_eq!(
            parse_date_time(" 2024-05-01T10:00:00-04:00 ", tz).unwrap(),
            utc("2024-05-01T14:00:00Z")
        );
    }

    #[test]
    fn test_bare_date_is_midnight() {
        let tz = chrono_tz::Europe::Amsterdam;
        assert_eq!(
            parse_date_time("2024-05-01", tz).unwrap(),
            utc("2024-04-30T22:00:00Z")
        );
    }

    #[test]
    fn test_garbage_is_invalid_argument() {
        let tz = chrono_tz::Europe::Amsterdam;
        for input in ["", "tomorrow", "2024-13-01T10:00:00", "10:00"] {
            let err = parse_date_time(input, tz).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input: {:?}", input);
        }
    }

    #[test]
    fn test_dst_gap_is_rejected() {
        let err = parse_date_time("2024-03-31T02:30:00", chrono_tz::Europe::Amsterdam)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_dst_overlap_takes_earliest() {
        assert_eq!(
            parse_date_time("2024-10-27T02:30:00", chrono_tz::Europe::Amsterdam).unwrap(),
            utc("2024-10-27T00:30:00Z")
        );
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(
            parse_time_zone("Europe/Amsterdam").unwrap(),
            chrono_tz::Europe::Amsterdam
        );
        assert_eq!(
            parse_time_zone("Nowhere/Special").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }
}
