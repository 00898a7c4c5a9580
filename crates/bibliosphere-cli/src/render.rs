//! Table output for non-JSON mode

use bibliosphere_core::{ActivitySummary, AggregateResult, DayBucket, PeriodRollup, StreakSummary};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

const HISTORY_ROWS: usize = 14;

pub fn print_streak(streak: &StreakSummary) {
    let current = format!("{} {}", streak.current_streak, plural_days(streak.current_streak));
    let current = if streak.current_streak > 0 {
        current.green().bold()
    } else {
        current.bright_black()
    };

    println!();
    println!("  Current streak: {}", current);
    println!(
        "  Longest streak: {}",
        format!("{} {}", streak.longest_streak, plural_days(streak.longest_streak)).cyan()
    );
    match streak.last_read_date {
        Some(day) => println!("  Last read:      {}", day),
        None => println!("  Last read:      {}", "never".bright_black()),
    }
    println!();

    if streak.streak_history.is_empty() {
        println!("{}", "  No reading sessions found.".bright_black());
        return;
    }

    let recent: Vec<DayBucket> = streak
        .streak_history
        .iter()
        .take(HISTORY_ROWS)
        .cloned()
        .collect();
    print_daily(&recent);
}

pub fn print_daily(daily: &[DayBucket]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Day", "Pages", "Time", "Sessions", "Activity"]);

    for bucket in daily {
        table.add_row(vec![
            bucket.day.to_string(),
            format_number(bucket.pages_read),
            format_minutes(bucket.duration_minutes),
            bucket.sessions.to_string(),
            intensity_bar(bucket.intensity),
        ]);
    }

    println!("{table}");
}

pub fn print_periods(label: &str, periods: &[PeriodRollup]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![label, "Pages", "Time", "Sessions", "Active days", "Range"]);

    for period in periods {
        table.add_row(vec![
            period.key.clone(),
            format_number(period.pages_read),
            format_minutes(period.duration_minutes),
            period.sessions.to_string(),
            period.active_days.to_string(),
            format!("{} → {}", period.range_start, period.range_end),
        ]);
    }

    println!("{table}");

    let total_pages: i64 = periods.iter().map(|p| p.pages_read).sum();
    let total_minutes: i64 = periods.iter().map(|p| p.duration_minutes).sum();
    println!(
        "\nTotal: {} pages | {}",
        format_number(total_pages),
        format_minutes(total_minutes)
    );
}

pub fn print_summary(summary: &ActivitySummary) {
    let range = match (summary.date_range_start, summary.date_range_end) {
        (Some(start), Some(end)) => format!("{} → {}", start, end),
        _ => "-".to_string(),
    };

    println!();
    println!("  Pages read:     {}", format_number(summary.total_pages).bold());
    println!("  Reading time:   {}", format_minutes(summary.total_minutes).bold());
    println!("  Sessions:       {}", summary.total_sessions);
    println!("  Active days:    {}", summary.active_days);
    println!(
        "  Per active day: {:.1} pages, {:.0} min",
        summary.average_pages_per_day, summary.average_minutes_per_day
    );
    println!("  Best day:       {} pages", format_number(summary.max_pages_in_single_day));
    println!("  Range:          {}", range.bright_black());
}

pub fn print_report(result: &AggregateResult) {
    println!(
        "{}",
        format!(
            "\n  Reading report as of {} ({})",
            result.meta.today, result.meta.time_zone
        )
        .bold()
    );
    print_summary(&result.summary);
    print_streak(&result.streak);
    println!();
    print_periods("Week", &result.weekly);
    println!();
    print_periods("Month", &result.monthly);
    println!();
    print_periods("Year", &result.yearly);
}

fn plural_days(n: u32) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

fn intensity_bar(intensity: u8) -> String {
    "█".repeat(intensity as usize)
}

pub fn format_number(n: i64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn format_minutes(minutes: i64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}
