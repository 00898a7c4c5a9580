mod config;
mod render;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use bibliosphere_core::{
    aggregate, filter_sessions, load_sessions, validate_sessions, AggregateOptions,
    AggregateResult,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use config::BiblioConfig;

#[derive(Parser)]
#[command(name = "bibliosphere")]
#[command(author, version, about = "Reading streaks and activity rollups")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    #[arg(
        short,
        long,
        global = true,
        help = "Session file or directory (JSON, JSONL, CSV, SQLite)"
    )]
    input: Option<PathBuf>,

    #[arg(long, global = true, help = "Reference time zone offset (UTC, +02:00, -0500)")]
    tz: Option<String>,

    #[arg(long, global = true, help = "Treat this day as today (YYYY-MM-DD)")]
    today: Option<String>,

    #[arg(long, global = true, help = "Start date (YYYY-MM-DD)")]
    since: Option<String>,

    #[arg(long, global = true, help = "End date (YYYY-MM-DD)")]
    until: Option<String>,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Enable debug logging on stderr")]
    debug: bool,

    #[arg(long, global = true, help = "Show processing time")]
    benchmark: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    #[command(about = "Show current and longest reading streak (default)")]
    Streak,
    #[command(about = "Show pages and time per day")]
    Daily,
    #[command(about = "Show pages and time per ISO week")]
    Weekly,
    #[command(about = "Show pages and time per month")]
    Monthly,
    #[command(about = "Show pages and time per year")]
    Yearly,
    #[command(about = "Show the full activity report")]
    Report,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.report.debug);

    let command = cli.command.unwrap_or(Commands::Streak);
    let config = BiblioConfig::load();

    let start = Instant::now();
    let result = build_report(&cli.report, &config)?;
    let processing_time_ms = start.elapsed().as_millis();

    if cli.report.json {
        print_json(command, &result)?;
    } else {
        print_tables(command, &result);
        if cli.report.benchmark {
            use colored::Colorize;
            println!(
                "{}",
                format!("  Processing time: {}ms", processing_time_ms).bright_black()
            );
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_report(args: &ReportArgs, config: &BiblioConfig) -> Result<AggregateResult> {
    let zone = config.resolve_zone(args.tz.as_deref())?;
    let options = match args.today.as_deref() {
        Some(day) => AggregateOptions::new(parse_day(day, "--today")?, zone),
        None => AggregateOptions::for_now(zone),
    };
    let since = args
        .since
        .as_deref()
        .map(|d| parse_day(d, "--since"))
        .transpose()?;
    let until = args
        .until
        .as_deref()
        .map(|d| parse_day(d, "--until"))
        .transpose()?;

    let path = config.resolve_sessions_path(args.input.clone())?;
    let raw = load_sessions(&path)
        .with_context(|| format!("Failed to load sessions from {}", path.display()))?;
    tracing::debug!(records = raw.len(), %zone, today = %options.today, "loaded session records");

    let sessions = validate_sessions(raw, zone).context("Invalid session data")?;
    let sessions = filter_sessions(sessions, since, until, zone);

    let result = aggregate(&sessions, options).context("Invalid session data")?;
    tracing::debug!(
        days = result.daily.len(),
        current = result.streak.current_streak,
        longest = result.streak.longest_streak,
        "aggregated sessions"
    );
    Ok(result)
}

fn parse_day(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}', expected YYYY-MM-DD", flag, value))
}

fn print_json(command: Commands, result: &AggregateResult) -> Result<()> {
    let output = match command {
        Commands::Streak => serde_json::to_string_pretty(&result.streak)?,
        Commands::Daily => serde_json::to_string_pretty(&result.daily)?,
        Commands::Weekly => serde_json::to_string_pretty(&result.weekly)?,
        Commands::Monthly => serde_json::to_string_pretty(&result.monthly)?,
        Commands::Yearly => serde_json::to_string_pretty(&result.yearly)?,
        Commands::Report => serde_json::to_string_pretty(result)?,
    };
    println!("{}", output);
    Ok(())
}

fn print_tables(command: Commands, result: &AggregateResult) {
    match command {
        Commands::Streak => render::print_streak(&result.streak),
        Commands::Daily => render::print_daily(&result.daily),
        Commands::Weekly => render::print_periods("Week", &result.weekly),
        Commands::Monthly => render::print_periods("Month", &result.monthly),
        Commands::Yearly => render::print_periods("Year", &result.yearly),
        Commands::Report => render::print_report(result),
    }
}
