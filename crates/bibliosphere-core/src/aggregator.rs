//! Aggregation of reading sessions into daily, weekly, monthly and yearly
//! rollups
//!
//! Day bucketing uses rayon for a parallel map-reduce; every output list is
//! ordered by an explicit sort, so the result never depends on input order.

use crate::calendar::{self, ReferenceZone};
use crate::error::ValidationError;
use crate::session::{validate_sessions, RawSession, ReadingSession};
use crate::streak::compute_streak;
use crate::{
    ActivitySummary, AggregateMeta, AggregateOptions, AggregateResult, DayBucket, PeriodRollup,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Aggregate sessions into rollups and a streak summary.
///
/// Every session is checked before any work is done; the first invalid one
/// fails the whole call.
pub fn aggregate(
    sessions: &[ReadingSession],
    options: AggregateOptions,
) -> Result<AggregateResult, ValidationError> {
    for (index, session) in sessions.iter().enumerate() {
        session.check(index)?;
    }

    let daily = aggregate_by_day(sessions, options.zone);
    let weekly = rollup_by(&daily, calendar::iso_week_key);
    let monthly = rollup_by(&daily, calendar::month_key);
    let yearly = rollup_by(&daily, calendar::year_key);
    let summary = calculate_summary(&daily);
    let streak = compute_streak(&daily, options.today);

    Ok(AggregateResult {
        meta: AggregateMeta {
            today: options.today,
            time_zone: options.zone.to_string(),
            version: crate::version(),
        },
        summary,
        daily,
        weekly,
        monthly,
        yearly,
        streak,
    })
}

/// Parse and validate raw store records, then [`aggregate`] them.
pub fn aggregate_raw(
    raw: Vec<RawSession>,
    options: AggregateOptions,
) -> Result<AggregateResult, ValidationError> {
    let sessions = validate_sessions(raw, options.zone)?;
    aggregate(&sessions, options)
}

/// Keep sessions whose day (in `zone`) lies within `since..=until`.
pub fn filter_sessions(
    sessions: Vec<ReadingSession>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    zone: ReferenceZone,
) -> Vec<ReadingSession> {
    if since.is_none() && until.is_none() {
        return sessions;
    }

    sessions
        .into_iter()
        .filter(|s| {
            let day = calendar::day_of(s.date, zone);
            let after_start = since.map(|start| day >= start).unwrap_or(true);
            let before_end = until.map(|end| day <= end).unwrap_or(true);
            after_start && before_end
        })
        .collect()
}

/// Merge sessions into one bucket per calendar day, oldest first.
pub fn aggregate_by_day(sessions: &[ReadingSession], zone: ReferenceZone) -> Vec<DayBucket> {
    if sessions.is_empty() {
        return Vec::new();
    }

    // Typical histories span a few hundred distinct days
    let estimated_days = (sessions.len() / 2).clamp(16, 400);

    let day_map: HashMap<NaiveDate, DayAccumulator> = sessions
        .par_iter()
        .fold(
            || HashMap::with_capacity(estimated_days),
            |mut acc: HashMap<NaiveDate, DayAccumulator>, session| {
                let day = calendar::day_of(session.date, zone);
                acc.entry(day).or_default().add_session(session);
                acc
            },
        )
        .reduce(
            || HashMap::with_capacity(estimated_days),
            |mut a, b| {
                for (day, acc) in b {
                    a.entry(day).or_default().merge(acc);
                }
                a
            },
        );

    let mut buckets: Vec<DayBucket> = Vec::with_capacity(day_map.len());
    buckets.extend(
        day_map
            .into_iter()
            .map(|(day, acc)| acc.into_bucket(day)),
    );

    buckets.sort_by(|a, b| a.day.cmp(&b.day));

    calculate_intensities(&mut buckets);

    buckets
}

/// Group day buckets under `key_fn`, ascending by key.
pub fn rollup_by<F>(daily: &[DayBucket], key_fn: F) -> Vec<PeriodRollup>
where
    F: Fn(NaiveDate) -> String,
{
    let mut periods: BTreeMap<String, PeriodAccumulator> = BTreeMap::new();

    for bucket in daily {
        periods
            .entry(key_fn(bucket.day))
            .or_insert_with(|| PeriodAccumulator::starting(bucket.day))
            .add_day(bucket);
    }

    periods
        .into_iter()
        .map(|(key, acc)| PeriodRollup {
            key,
            pages_read: acc.pages_read,
            duration_minutes: acc.duration_minutes,
            sessions: acc.sessions,
            active_days: acc.active_days,
            range_start: acc.start,
            range_end: acc.end,
        })
        .collect()
}

/// Calculate summary statistics
pub fn calculate_summary(daily: &[DayBucket]) -> ActivitySummary {
    let total_pages: i64 = daily.iter().map(|d| d.pages_read).sum();
    let total_minutes: i64 = daily.iter().map(|d| d.duration_minutes).sum();
    let total_sessions: u32 = daily.iter().map(|d| d.sessions).sum();
    let active_days = daily.len() as u32;
    let max_pages = daily.iter().map(|d| d.pages_read).max().unwrap_or(0);

    let (average_pages_per_day, average_minutes_per_day) = if active_days > 0 {
        (
            total_pages as f64 / active_days as f64,
            total_minutes as f64 / active_days as f64,
        )
    } else {
        (0.0, 0.0)
    };

    ActivitySummary {
        total_pages,
        total_minutes,
        total_sessions,
        active_days,
        average_pages_per_day,
        average_minutes_per_day,
        max_pages_in_single_day: max_pages,
        date_range_start: daily.iter().map(|d| d.day).min(),
        date_range_end: daily.iter().map(|d| d.day).max(),
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

#[derive(Default)]
struct DayAccumulator {
    pages_read: i64,
    duration_minutes: i64,
    sessions: u32,
}

impl DayAccumulator {
    fn add_session(&mut self, session: &ReadingSession) {
        self.pages_read = self.pages_read.saturating_add(session.pages_read);
        self.duration_minutes = self
            .duration_minutes
            .saturating_add(session.duration_minutes);
        self.sessions = self.sessions.saturating_add(1);
    }

    fn merge(&mut self, other: DayAccumulator) {
        self.pages_read = self.pages_read.saturating_add(other.pages_read);
        self.duration_minutes = self
            .duration_minutes
            .saturating_add(other.duration_minutes);
        self.sessions = self.sessions.saturating_add(other.sessions);
    }

    fn into_bucket(self, day: NaiveDate) -> DayBucket {
        DayBucket {
            day,
            pages_read: self.pages_read,
            duration_minutes: self.duration_minutes,
            sessions: self.sessions,
            intensity: 0,
        }
    }
}

struct PeriodAccumulator {
    pages_read: i64,
    duration_minutes: i64,
    sessions: u32,
    active_days: u32,
    start: NaiveDate,
    end: NaiveDate,
}

impl PeriodAccumulator {
    fn starting(day: NaiveDate) -> Self {
        Self {
            pages_read: 0,
            duration_minutes: 0,
            sessions: 0,
            active_days: 0,
            start: day,
            end: day,
        }
    }

    fn add_day(&mut self, bucket: &DayBucket) {
        self.pages_read = self.pages_read.saturating_add(bucket.pages_read);
        self.duration_minutes = self
            .duration_minutes
            .saturating_add(bucket.duration_minutes);
        self.sessions = self.sessions.saturating_add(bucket.sessions);
        self.active_days += 1;
        self.start = self.start.min(bucket.day);
        self.end = self.end.max(bucket.day);
    }
}

/// Grade each day 0-4 against the busiest day by pages, or by minutes when
/// no pages were logged at all.
fn calculate_intensities(buckets: &mut [DayBucket]) {
    let max_pages = buckets.iter().map(|b| b.pages_read).max().unwrap_or(0);
    let use_pages = max_pages > 0;
    let max_value = if use_pages {
        max_pages
    } else {
        buckets.iter().map(|b| b.duration_minutes).max().unwrap_or(0)
    };

    if max_value == 0 {
        return;
    }

    for b in buckets.iter_mut() {
        let value = if use_pages {
            b.pages_read
        } else {
            b.duration_minutes
        };
        let ratio = value as f64 / max_value as f64;
        b.intensity = if ratio >= 0.75 {
            4
        } else if ratio >= 0.5 {
            3
        } else if ratio >= 0.25 {
            2
        } else if ratio > 0.0 {
            1
        } else {
            0
        };
    }
}
