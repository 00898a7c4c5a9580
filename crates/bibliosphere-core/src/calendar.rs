//! Calendar math for day bucketing
//!
//! All day boundaries are computed in one explicit [`ReferenceZone`], never
//! in the host's local time.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use std::fmt;
use std::str::FromStr;

/// Fixed UTC offset used for every day-boundary calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone(FixedOffset);

impl ReferenceZone {
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    pub fn from_offset_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self)
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    pub fn offset_seconds(&self) -> i32 {
        self.0.local_minus_utc()
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.offset_seconds();
        if seconds == 0 {
            return write!(f, "UTC");
        }
        let sign = if seconds < 0 { '-' } else { '+' };
        let abs = seconds.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

impl FromStr for ReferenceZone {
    type Err = String;

    /// Accepts `UTC`, `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` and `+HH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Self::utc());
        }

        let invalid = || format!("invalid time zone offset '{}'", s);

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };

        // HH, HHMM or HH:MM
        let digits = match rest.as_bytes() {
            [_, _, b':', _, _] => format!("{}{}", &rest[..2], &rest[3..]),
            _ => rest.to_string(),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let (hours, minutes) = match digits.len() {
            2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
            4 => (
                digits[0..2].parse::<i32>().map_err(|_| invalid())?,
                digits[2..4].parse::<i32>().map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        Self::from_offset_seconds(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
    }
}

/// Calendar day of `instant` as seen from `zone`.
pub fn day_of(instant: DateTime<Utc>, zone: ReferenceZone) -> NaiveDate {
    instant.with_timezone(&zone.offset()).date_naive()
}

pub fn today(zone: ReferenceZone) -> NaiveDate {
    day_of(Utc::now(), zone)
}

/// ISO-8601 week key, e.g. `2024-W10`. Uses the ISO week-year, so
/// 2024-12-30 belongs to `2025-W01`.
pub fn iso_week_key(day: NaiveDate) -> String {
    let week = day.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

pub fn month_key(day: NaiveDate) -> String {
    format!("{:04}-{:02}", day.year(), day.month())
}

pub fn year_key(day: NaiveDate) -> String {
    format!("{:04}", day.year())
}

/// Whole days from `earlier` to `later`; negative when `later` precedes it.
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_zone_variants() {
        assert_eq!("UTC".parse::<ReferenceZone>().unwrap(), ReferenceZone::utc());
        assert_eq!("z".parse::<ReferenceZone>().unwrap(), ReferenceZone::utc());
        assert_eq!(
            "+05:30".parse::<ReferenceZone>().unwrap().offset_seconds(),
            5 * 3600 + 30 * 60
        );
        assert_eq!(
            "-0800".parse::<ReferenceZone>().unwrap().offset_seconds(),
            -8 * 3600
        );
        assert_eq!("+09".parse::<ReferenceZone>().unwrap().offset_seconds(), 9 * 3600);
    }

    #[test]
    fn test_parse_zone_rejects_garbage() {
        assert!("Europe/Paris".parse::<ReferenceZone>().is_err());
        assert!("+25:00".parse::<ReferenceZone>().is_err());
        assert!("+12:3".parse::<ReferenceZone>().is_err());
        assert!("+:1234".parse::<ReferenceZone>().is_err());
        assert!("+1:234".parse::<ReferenceZone>().is_err());
        assert!("+1234:".parse::<ReferenceZone>().is_err());
        assert!("+12::34".parse::<ReferenceZone>().is_err());
        assert!("".parse::<ReferenceZone>().is_err());
    }

    #[test]
    fn test_zone_display() {
        assert_eq!(ReferenceZone::utc().to_string(), "UTC");
        assert_eq!("+05:30".parse::<ReferenceZone>().unwrap().to_string(), "+05:30");
        assert_eq!("-03:00".parse::<ReferenceZone>().unwrap().to_string(), "-03:00");
    }

    #[test]
    fn test_day_of_shifts_with_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        assert_eq!(day_of(instant, ReferenceZone::utc()), date("2024-03-09"));
        assert_eq!(
            day_of(instant, "+02:00".parse().unwrap()),
            date("2024-03-10")
        );

        let early = Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
        assert_eq!(day_of(early, "-05:00".parse().unwrap()), date("2024-03-09"));
    }

    #[test]
    fn test_iso_week_key_year_boundary() {
        assert_eq!(iso_week_key(date("2024-03-10")), "2024-W10");
        assert_eq!(iso_week_key(date("2024-12-30")), "2025-W01");
        assert_eq!(iso_week_key(date("2021-01-03")), "2020-W53");
    }

    #[test]
    fn test_month_and_year_keys() {
        assert_eq!(month_key(date("2024-03-10")), "2024-03");
        assert_eq!(year_key(date("2024-03-10")), "2024");
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date("2024-03-10"), date("2024-03-08")), 2);
        assert_eq!(days_between(date("2024-03-01"), date("2024-02-28")), 2);
        assert_eq!(days_between(date("2024-03-08"), date("2024-03-10")), -2);
    }
}
