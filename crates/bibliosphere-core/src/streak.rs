//! Consecutive-day streak detection
//!
//! The scan walks days most recent first. Each gap is measured from the
//! previously visited day (starting at `today`), so a gap of at most one
//! day keeps the run going and anything larger starts a new run.

use crate::calendar::days_between;
use crate::{DayBucket, StreakSummary};
use chrono::NaiveDate;

/// Compute the streak summary for `daily` buckets (any order, one per day).
pub fn compute_streak(daily: &[DayBucket], today: NaiveDate) -> StreakSummary {
    if daily.is_empty() {
        return StreakSummary::default();
    }

    let mut history = daily.to_vec();
    history.sort_by(|a, b| b.day.cmp(&a.day));

    let mut reference_day = today;
    let mut running = 0u32;
    let mut longest = 0u32;
    // Length of the run that contains the most recent bucket, once closed.
    let mut leading_run: Option<u32> = None;

    for bucket in &history {
        let gap = days_between(reference_day, bucket.day);
        if gap <= 1 {
            running += 1;
        } else {
            if leading_run.is_none() {
                leading_run = Some(running);
            }
            running = 1;
        }
        longest = longest.max(running);
        reference_day = bucket.day;
    }

    let leading_run = leading_run.unwrap_or(running);
    let last_read = history[0].day;
    let current_streak = if days_between(today, last_read) <= 1 {
        leading_run
    } else {
        0
    };

    StreakSummary {
        current_streak,
        longest_streak: longest,
        last_read_date: Some(last_read),
        streak_history: history,
    }
}
