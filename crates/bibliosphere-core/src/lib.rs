#![deny(clippy::all)]

mod aggregator;
pub mod calendar;
mod error;
pub mod loader;
mod session;
mod streak;

pub use aggregator::*;
pub use calendar::ReferenceZone;
pub use error::{LoadError, ValidationError};
pub use loader::load_sessions;
pub use session::{parse_session_date, validate_sessions, RawSession, ReadingSession};
pub use streak::compute_streak;

use chrono::NaiveDate;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// All sessions that fall on one calendar day, merged.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub day: NaiveDate,
    pub pages_read: i64,
    pub duration_minutes: i64,
    pub sessions: u32,
    /// Heat-map grade 0-4 relative to the busiest day in the result.
    pub intensity: u8,
}

/// Totals for an ISO week (`YYYY-Www`), month (`YYYY-MM`) or year (`YYYY`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRollup {
    pub key: String,
    pub pages_read: i64,
    pub duration_minutes: i64,
    pub sessions: u32,
    pub active_days: u32,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_date: Option<NaiveDate>,
    /// Most recent day first.
    pub streak_history: Vec<DayBucket>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_pages: i64,
    pub total_minutes: i64,
    pub total_sessions: u32,
    pub active_days: u32,
    pub average_pages_per_day: f64,
    pub average_minutes_per_day: f64,
    pub max_pages_in_single_day: i64,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMeta {
    pub today: NaiveDate,
    pub time_zone: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub meta: AggregateMeta,
    pub summary: ActivitySummary,
    pub daily: Vec<DayBucket>,
    pub weekly: Vec<PeriodRollup>,
    pub monthly: Vec<PeriodRollup>,
    pub yearly: Vec<PeriodRollup>,
    pub streak: StreakSummary,
}

/// Inputs that pin an aggregation to a calendar: the caller's current day
/// and the zone used for every day boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub today: NaiveDate,
    pub zone: ReferenceZone,
}

impl AggregateOptions {
    pub fn new(today: NaiveDate, zone: ReferenceZone) -> Self {
        Self { today, zone }
    }

    /// Reads the wall clock. Keep this at the outermost call site.
    pub fn for_now(zone: ReferenceZone) -> Self {
        Self {
            today: calendar::today(zone),
            zone,
        }
    }
}
