//! Wire-format types shared across SMRT components
//!
//! SMRT files and the relational store both carry dates as `YYYYMMDD` and
//! times as `HHMMSS` strings. These newtypes keep the textual encoding as the
//! source of truth: a value is only constructed once the string has been
//! checked to be a real calendar date / time of day, and the original text
//! is what gets stored and compared.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Result, SmrtError};

/// `strftime` pattern for wire dates
pub const DATE_FORMAT: &str = "%Y%m%d";

/// `strftime` pattern for wire times
pub const TIME_FORMAT: &str = "%H%M%S";

const DATE_LEN: usize = 8;
const TIME_LEN: usize = 6;

const MIN_YEAR: i32 = 1;

fn is_leap_second(time: NaiveTime) -> bool {
    time.nanosecond() >= 1_000_000_000
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// A calendar date in `YYYYMMDD` form (e.g. `"20240101"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireDate(String);

impl WireDate {
    /// Validate and wrap a `YYYYMMDD` string.
    ///
    /// Rejects anything that is not exactly 8 ASCII digits or does not name a
    /// real calendar day (`20241301`, `20230229`). Years run from 1 to 9999.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != DATE_LEN || !all_digits(s) {
            return Err(SmrtError::InvalidDate(s.to_string()));
        }

        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| SmrtError::InvalidDate(s.to_string()))?;
        if date.year() < MIN_YEAR {
            return Err(SmrtError::InvalidDate(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WireDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A time of day in `HHMMSS` form (e.g. `"120000"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireTime(String);

impl WireTime {
    /// Validate and wrap an `HHMMSS` string.
    ///
    /// The length check comes first: `"1200"` is rejected even though some
    /// time parsers would accept it. Seconds stop at 59; chrono reads `60` as
    /// a leap second, which is not a valid wire time.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != TIME_LEN || !all_digits(s) {
            return Err(SmrtError::InvalidTime(s.to_string()));
        }

        let time = NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map_err(|_| SmrtError::InvalidTime(s.to_string()))?;
        if is_leap_second(time) {
            return Err(SmrtError::InvalidTime(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Format a time of day. A leap second is written as `59`.
    pub fn from_time(time: NaiveTime) -> Self {
        let time = if is_leap_second(time) {
            time.with_nanosecond(0).unwrap_or(time)
        } else {
            time
        };
        Self(time.format(TIME_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WireTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A date/time pair as written to the store (receipt and last-updated columns)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stamp {
    pub date: WireDate,
    pub time: WireTime,
}

impl Stamp {
    pub fn new(date: WireDate, time: WireTime) -> Self {
        Self { date, time }
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self {
            date: WireDate::from_date(dt.date()),
            time: WireTime::from_time(dt.time()),
        }
    }
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wire_date_accepts_calendar_dates() {
        assert_eq!(WireDate::parse("20240101").unwrap().as_str(), "20240101");
        assert!(WireDate::parse("20240229").is_ok());
        assert!(WireDate::parse("19991231").is_ok());
    }

    #[test]
    fn test_wire_date_rejects_invalid_calendar_dates() {
        assert!(WireDate::parse("20241301").is_err());
        assert!(WireDate::parse("20240001").is_err());
        assert!(WireDate::parse("20240132").is_err());
        assert!(WireDate::parse("20230229").is_err());
        assert!(WireDate::parse("00000101").is_err());
        assert!(WireDate::parse("00011231").is_ok());
    }

    #[test]
    fn test_wire_date_rejects_wrong_shape() {
        assert!(WireDate::parse("").is_err());
        assert!(WireDate::parse("2024011").is_err());
        assert!(WireDate::parse("202401011").is_err());
        assert!(WireDate::parse("2024-1-1").is_err());
        assert!(WireDate::parse(" 2024011").is_err());
        assert!(matches!(
            WireDate::parse("abcdefgh"),
            Err(SmrtError::InvalidDate(s)) if s == "abcdefgh"
        ));
    }

    #[test]
    fn test_wire_time_accepts_valid_times() {
        assert_eq!(WireTime::parse("120000").unwrap().as_str(), "120000");
        assert!(WireTime::parse("000000").is_ok());
        assert!(WireTime::parse("235959").is_ok());
    }

    #[test]
    fn test_wire_time_rejects_invalid_times() {
        assert!(WireTime::parse("1200").is_err());
        assert!(WireTime::parse("12000").is_err());
        assert!(WireTime::parse("1200000").is_err());
        assert!(WireTime::parse("240000").is_err());
        assert!(WireTime::parse("126000").is_err());
        assert!(WireTime::parse("12:00:").is_err());
        assert!(WireTime::parse("120060").is_err());
        assert!(WireTime::parse("235960").is_err());
        assert!(WireTime::parse("235999").is_err());
    }

    #[test]
    fn test_wire_time_seconds_boundary() {
        assert!(WireTime::parse("235959").is_ok());
        assert!(WireTime::parse("000059").is_ok());
        assert!(matches!(
            WireTime::parse("000060"),
            Err(SmrtError::InvalidTime(s)) if s == "000060"
        ));
    }

    #[test]
    fn test_wire_time_from_leap_second_clamps_to_59() {
        let leap = NaiveTime::from_hms_milli_opt(23, 59, 59, 1_500).unwrap();
        let time = WireTime::from_time(leap);
        assert_eq!(time.as_str(), "235959");
        assert!(WireTime::parse(time.as_str()).is_ok());
    }

    #[test]
    fn test_stamp_from_datetime_is_zero_padded() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        let stamp = Stamp::from_datetime(dt);
        assert_eq!(stamp.date.as_str(), "20240307");
        assert_eq!(stamp.time.as_str(), "090501");
        assert_eq!(stamp.to_string(), "20240307 090501");
    }

    #[test]
    fn test_stamp_ordering_follows_text() {
        let earlier = Stamp::new(
            WireDate::parse("20240101").unwrap(),
            WireTime::parse("235959").unwrap(),
        );
        let later = Stamp::new(
            WireDate::parse("20240102").unwrap(),
            WireTime::parse("000000").unwrap(),
        );
        assert!(earlier < later);
    }

    proptest! {
        #[test]
        fn prop_any_real_day_is_a_wire_date(y in 1000i32..=9999, m in 1u32..=12, d in 1u32..=28) {
            let text = format!("{:04}{:02}{:02}", y, m, d);
            prop_assert!(WireDate::parse(&text).is_ok());
        }

        #[test]
        fn prop_months_past_twelve_are_rejected(y in 1000i32..=9999, m in 13u32..=99, d in 1u32..=28) {
            let text = format!("{:04}{:02}{:02}", y, m, d);
            prop_assert!(WireDate::parse(&text).is_err());
        }
    }
}
