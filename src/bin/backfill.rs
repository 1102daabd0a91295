use anyhow::{bail, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use clap::Parser;
use reckoner::{config::Config, pipeline};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Run the reckoner cycle over a range of past dates, oldest first"
)]
struct Args {
    /// First date (YYYY-MM-DD), inclusive
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,
    /// Last date (YYYY-MM-DD), inclusive
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,
    /// Process the last N days up to and including today
    #[arg(long, conflicts_with_all = ["start", "end"])]
    days: Option<u32>,
    /// Also process Saturdays and Sundays
    #[arg(long)]
    include_weekends: bool,
    /// Config file (defaults to $RECKONER_CONFIG or ./reckoner.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn dates_between(start: NaiveDate, end: NaiveDate, include_weekends: bool) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| include_weekends || !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;

    let today = Local::now().date_naive();
    let (start, end) = match (args.start, args.end, args.days) {
        (Some(start), Some(end), _) => (start, end),
        (_, _, Some(days)) => (today - Duration::days(i64::from(days)), today),
        _ => (today, today),
    };
    if start > end {
        bail!("start {} is after end {}", start, end);
    }

    let dates = dates_between(start, end, args.include_weekends);
    info!(%start, %end, count = dates.len(), "backfilling");

    let mut succeeded = 0usize;
    for date in &dates {
        match pipeline::run(&cfg, *date) {
            Ok(report) => {
                succeeded += 1;
                info!(%date, document = %report.document, observed = report.observed, "processed");
            }
            Err(e) => warn!(%date, "skipped: {:#}", e),
        }
    }

    let total = dates.len();
    let rate = if total > 0 {
        succeeded as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    info!(total, succeeded, "success rate {:.1}%", rate);
    println!("processed {} dates, {} succeeded ({:.1}%)", total, succeeded, rate);

    if total > 0 && succeeded == 0 {
        bail!("no date in {}..={} could be processed", start, end);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_skipped_by_default() {
        // 2025-03-07 is a Friday
        let dates = dates_between(d(2025, 3, 7), d(2025, 3, 10), false);
        assert_eq!(dates, vec![d(2025, 3, 7), d(2025, 3, 10)]);
        assert_eq!(dates_between(d(2025, 3, 7), d(2025, 3, 10), true).len(), 4);
    }

    #[test]
    fn range_crosses_year_end() {
        let dates = dates_between(d(2024, 12, 30), d(2025, 1, 2), true);
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[2], d(2025, 1, 1));
    }

    #[test]
    fn start_and_end_go_together() {
        assert!(Args::try_parse_from(["backfill", "--start", "2025-01-01"]).is_err());
        assert!(Args::try_parse_from(["backfill", "--days", "3", "--start", "2025-01-01", "--end", "2025-01-02"]).is_err());
        let args = Args::try_parse_from(["backfill", "--start", "2025-01-01", "--end", "2025-01-05"]).unwrap();
        assert_eq!(args.start, Some(d(2025, 1, 1)));
    }
}
