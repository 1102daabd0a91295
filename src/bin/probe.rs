use anyhow::Result;
use chrono::{Duration, Local};
use clap::Parser;
use reckoner::{config::Config, fetch::Fetcher};
use std::{path::PathBuf, thread};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Check which candidate document URLs answer for recent dates"
)]
struct Args {
    /// How many days back from today to probe
    #[arg(long, default_value_t = 7)]
    days: u32,
    /// Config file (defaults to $RECKONER_CONFIG or ./reckoner.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    let fetcher = Fetcher::new(&cfg)?;
    let today = Local::now().date_naive();

    let mut found = 0usize;
    for back in 0..=i64::from(args.days) {
        let date = today - Duration::days(back);
        for url in fetcher.candidates(date)? {
            match fetcher.probe(&url) {
                Ok((status, len)) if status.is_success() => {
                    found += 1;
                    let size = len.map_or_else(|| "unknown".to_string(), |l| l.to_string());
                    println!("{}  {}  {}  {} bytes", date, status.as_u16(), url, size);
                }
                Ok((status, _)) => debug!(%url, %status, "no document"),
                Err(e) => debug!(%url, error = %e, "request failed"),
            }
            thread::sleep(cfg.attempt_pause());
        }
    }

    info!(found, days = args.days, "probe finished");
    Ok(())
}
