//! Time utilities: the reference date used for relative due dates.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// The calendar date of `now` as seen in `tz`.
///
/// A task typed at 23:30 in Chicago is "today" in Chicago even though UTC has
/// already rolled over, so relative phrases must resolve against this date.
pub fn reference_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Reference date for `now` in the named timezone.
pub fn reference_date_in(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    Ok(reference_date(now, parse_timezone(tz)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_date_lags_utc_in_chicago() {
        // 2026-02-21 03:00 UTC is still Feb 20 in CST (UTC-6)
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        let d = reference_date_in(now, "America/Chicago").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
