//! Reading session records
//!
//! `RawSession` is what a store hands over (string dates, unchecked counts);
//! `ReadingSession` is what the aggregator consumes.

use crate::calendar::ReferenceZone;
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    pub date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub pages_read: i64,
}

impl ReadingSession {
    pub fn new(date: DateTime<Utc>, duration_minutes: i64, pages_read: i64) -> Self {
        Self {
            date,
            duration_minutes,
            pages_read,
        }
    }

    pub(crate) fn check(&self, index: usize) -> Result<(), ValidationError> {
        if self.pages_read < 0 {
            return Err(ValidationError::NegativePages {
                index,
                value: self.pages_read,
            });
        }
        if self.duration_minutes < 0 {
            return Err(ValidationError::NegativeDuration {
                index,
                value: self.duration_minutes,
            });
        }
        Ok(())
    }
}

/// A session row as exported by the store. Accepts both the app's camelCase
/// field names and snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSession {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "duration_minutes", deserialize_with = "count_or_zero")]
    pub duration_minutes: i64,
    #[serde(default, alias = "pages_read", deserialize_with = "count_or_zero")]
    pub pages_read: i64,
}

/// `null` and empty CSV fields read as zero.
fn count_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

// Shortest digit string taken as epoch milliseconds (1970-04-26).
const MIN_EPOCH_MS_DIGITS: usize = 11;

impl RawSession {
    pub fn new(date: impl Into<String>, duration_minutes: i64, pages_read: i64) -> Self {
        Self {
            date: Some(date.into()),
            duration_minutes,
            pages_read,
        }
    }

    pub fn into_session(
        self,
        index: usize,
        zone: ReferenceZone,
    ) -> Result<ReadingSession, ValidationError> {
        let raw_date = match self.date.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => return Err(ValidationError::MissingDate { index }),
        };

        let date = parse_session_date(raw_date, zone).ok_or_else(|| {
            ValidationError::InvalidDate {
                index,
                value: raw_date.to_string(),
            }
        })?;

        let session = ReadingSession::new(date, self.duration_minutes, self.pages_read);
        session.check(index)?;
        Ok(session)
    }
}

/// Parse a stored session date.
///
/// Zone-less values are wall time in `zone`. Bare integers of at least 11
/// digits are epoch milliseconds; shorter ones are rejected.
pub fn parse_session_date(value: &str, zone: ReferenceZone) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if value.len() < MIN_EPOCH_MS_DIGITS {
            return None;
        }
        return value
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    zone.offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert every raw record or fail on the first bad one.
pub fn validate_sessions(
    raw: Vec<RawSession>,
    zone: ReferenceZone,
) -> Result<Vec<ReadingSession>, ValidationError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, r)| r.into_session(index, zone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::day_of;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        let utc = ReferenceZone::utc();
        let parsed = parse_session_date("2024-03-10T08:15:00+02:00", utc).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-10T06:15:00+00:00");

        let parsed = parse_session_date("2024-03-10T23:59:59.500Z", utc).unwrap();
        assert_eq!(day_of(parsed, utc), date("2024-03-10"));
    }

    #[test]
    fn test_parse_date_only_stays_on_day_in_zone() {
        let zone: ReferenceZone = "-08:00".parse().unwrap();
        let parsed = parse_session_date("2024-03-10", zone).unwrap();
        assert_eq!(day_of(parsed, zone), date("2024-03-10"));
        assert_eq!(parsed.to_rfc3339(), "2024-03-10T08:00:00+00:00");
    }

    #[test]
    fn test_parse_naive_datetime_uses_zone() {
        let zone: ReferenceZone = "+09:00".parse().unwrap();
        let parsed = parse_session_date("2024-03-10 01:30:00", zone).unwrap();
        assert_eq!(day_of(parsed, zone), date("2024-03-10"));
        assert_eq!(day_of(parsed, ReferenceZone::utc()), date("2024-03-09"));

        assert!(parse_session_date("2024-03-10T01:30", zone).is_some());
    }

    #[test]
    fn test_parse_epoch_millis() {
        // 2024-06-15 12:00:00 UTC
        let parsed = parse_session_date("1718452800000", ReferenceZone::utc()).unwrap();
        assert_eq!(day_of(parsed, ReferenceZone::utc()), date("2024-06-15"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let utc = ReferenceZone::utc();
        assert!(parse_session_date("last tuesday", utc).is_none());
        assert!(parse_session_date("2024-13-01", utc).is_none());
        assert!(parse_session_date("2024-02-30", utc).is_none());
    }

    #[test]
    fn test_parse_rejects_short_digit_strings() {
        let utc = ReferenceZone::utc();
        assert!(parse_session_date("2024", utc).is_none());
        assert!(parse_session_date("20240310", utc).is_none());
        assert!(parse_session_date("-1718452800000", utc).is_none());

        let err = RawSession::new("2024", 10, 5)
            .into_session(3, utc)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDate {
                index: 3,
                value: "2024".to_string()
            }
        );
    }

    #[test]
    fn test_into_session_missing_date() {
        let raw = RawSession {
            date: None,
            duration_minutes: 10,
            pages_read: 5,
        };
        assert_eq!(
            raw.into_session(2, ReferenceZone::utc()),
            Err(ValidationError::MissingDate { index: 2 })
        );

        let blank = RawSession::new("  ", 10, 5);
        assert_eq!(
            blank.into_session(0, ReferenceZone::utc()),
            Err(ValidationError::MissingDate { index: 0 })
        );
    }

    #[test]
    fn test_into_session_negative_counts() {
        let raw = RawSession::new("2024-03-10", 10, -1);
        assert_eq!(
            raw.into_session(1, ReferenceZone::utc()),
            Err(ValidationError::NegativePages { index: 1, value: -1 })
        );

        let raw = RawSession::new("2024-03-10", -5, 0);
        assert_eq!(
            raw.into_session(0, ReferenceZone::utc()),
            Err(ValidationError::NegativeDuration { index: 0, value: -5 })
        );
    }

    #[test]
    fn test_validate_sessions_reports_first_bad_record() {
        let raw = vec![
            RawSession::new("2024-03-08", 40, 30),
            RawSession::new("not a date", 25, 20),
            RawSession::new("2024-03-10", 15, -3),
        ];
        let err = validate_sessions(raw, ReferenceZone::utc()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDate {
                index: 1,
                value: "not a date".to_string()
            }
        );
    }

    #[test]
    fn test_raw_session_accepts_both_casings() {
        let camel: RawSession =
            serde_json::from_str(r#"{"date":"2024-03-10","durationMinutes":15,"pagesRead":10}"#)
                .unwrap();
        let snake: RawSession =
            serde_json::from_str(r#"{"date":"2024-03-10","duration_minutes":15,"pages_read":10}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.pages_read, 10);
    }

    #[test]
    fn test_raw_session_zero_counts_default() {
        let raw: RawSession = serde_json::from_str(r#"{"date":"2024-03-10","pagesRead":12}"#).unwrap();
        assert_eq!(raw.duration_minutes, 0);
        let session = raw.into_session(0, ReferenceZone::utc()).unwrap();
        assert_eq!(session.pages_read, 12);
        assert_eq!(session.duration_minutes, 0);
    }

    #[test]
    fn test_raw_session_null_counts_read_as_zero() {
        let raw: RawSession = serde_json::from_str(
            r#"{"date":"2024-03-08","durationMinutes":null,"pagesRead":30}"#,
        )
        .unwrap();
        assert_eq!(raw, RawSession::new("2024-03-08", 0, 30));
    }
}
