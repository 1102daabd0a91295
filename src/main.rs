use anyhow::Result;
use chrono::Local;
use reckoner::{config::Config, pipeline};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) config ───────────────────────────────────────────────────
    let cfg = Config::load(None)?;

    // ─── 3) one cycle for today ──────────────────────────────────────
    let today = Local::now().date_naive();
    let report = match pipeline::run(&cfg, today) {
        Ok(report) => report,
        Err(e) => {
            error!(%today, "run failed: {:#}", e);
            return Err(e);
        }
    };

    let updated = report
        .categories
        .iter()
        .filter(|c| matches!(c.outcome, Ok(o) if o.changed()))
        .count();
    if report.observed == 0 {
        warn!(document = %report.document, "no category prices found; all series carried forward");
    }
    info!(
        document = %report.document,
        observed = report.observed,
        updated,
        "done"
    );
    Ok(())
}
