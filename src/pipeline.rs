// src/pipeline.rs

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

use crate::categories::{self, Category, Mapped};
use crate::config::Config;
use crate::document::Document;
use crate::error::ExtractionError;
use crate::extract::{self, RawRow, TableRows};
use crate::fetch::Fetcher;
use crate::locate::{Located, Locator};
use crate::series::{MergeOutcome, SeriesStore};

/// Prices read from one document, at most one per category.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    pub date: NaiveDate,
    prices: BTreeMap<Category, f64>,
}

impl Observations {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            prices: BTreeMap::new(),
        }
    }

    /// Keep the first price seen for a category; later rows are ignored.
    pub fn record(&mut self, category: Category, price: f64) -> bool {
        if self.prices.contains_key(&category) {
            return false;
        }
        self.prices.insert(category, price);
        true
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.prices.get(&category).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Map every row, dropping unmatched rows and rows with unreadable prices.
pub fn observe(date: NaiveDate, rows: impl IntoIterator<Item = RawRow>) -> Observations {
    let mut obs = Observations::new(date);
    let mut dropped = 0usize;

    for row in rows {
        match categories::map(&row) {
            Ok(Mapped::Price(category, price)) => {
                if obs.record(category, price) {
                    debug!(%category, price, line = row.line, "observed");
                } else {
                    debug!(%category, price, line = row.line, "duplicate row ignored");
                }
            }
            Ok(Mapped::Unmatched) => {}
            Err(e) => {
                dropped += 1;
                warn!(line = row.line, label = %row.label(), error = %e, "dropping row");
            }
        }
    }

    info!(%date, observed = obs.len(), dropped, "rows mapped");
    obs
}

/// How one category fared in a run.
#[derive(Debug)]
pub struct CategoryResult {
    pub category: Category,
    pub outcome: Result<MergeOutcome>,
}

#[derive(Debug)]
pub struct RunReport {
    pub date: NaiveDate,
    pub document: String,
    pub observed: usize,
    pub categories: Vec<CategoryResult>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &CategoryResult> {
        self.categories.iter().filter(|c| c.outcome.is_err())
    }
}

fn merge_one(store: &SeriesStore, category: Category, obs: &Observations) -> Result<MergeOutcome> {
    let mut series = store.load(category)?;
    let outcome = series.merge(obs.get(category), obs.date);
    if outcome.changed() {
        store.save(&series)?;
    }
    Ok(outcome)
}

/// Merge `obs` into every category's series. A category that fails is
/// reported and the rest still merge; nothing is rolled back.
pub fn apply(store: &SeriesStore, obs: &Observations) -> Vec<CategoryResult> {
    categories::ALL
        .iter()
        .map(|&category| {
            let outcome = merge_one(store, category, obs);
            match &outcome {
                Ok(MergeOutcome::Appended { filled, observed }) => {
                    info!(%category, filled, observed, "series updated")
                }
                Ok(MergeOutcome::AlreadyCurrent) => {
                    info!(%category, "series already current")
                }
                Ok(MergeOutcome::NoHistory) => {
                    info!(%category, "no price and no history; series not started")
                }
                Err(e) => error!(%category, error = %e, "merge failed"),
            }
            CategoryResult { category, outcome }
        })
        .collect()
}

/// The document for `date` and its table rows. Uses the archived copy when
/// it reads; a missing or unreadable copy is downloaded again over the
/// archive path.
pub fn obtain(cfg: &Config, date: NaiveDate) -> Result<(Document, TableRows)> {
    let locator = Locator::new(&cfg.archive_dir, cfg.min_document_bytes);
    let dest = match locator.locate(date)? {
        Located::Found(doc_ref) => {
            info!(path = %doc_ref.path.display(), "using archived document");
            let doc = doc_ref.read()?;
            match extract::extract(&doc) {
                Ok(rows) => return Ok((doc, rows)),
                Err(e @ (ExtractionError::NotPdf { .. } | ExtractionError::Text { .. })) => {
                    warn!(
                        path = %doc_ref.path.display(),
                        error = %e,
                        "archived document unreadable; fetching again"
                    );
                    locator.archive_path(date)
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("extracting {}", doc.name));
                }
            }
        }
        Located::NotFound { name, archive_path } => {
            info!(%name, "document not archived; fetching");
            archive_path
        }
    };

    let fetcher = Fetcher::new(cfg)?;
    let doc = fetcher.fetch(date, &dest)?;
    let rows = extract::extract(&doc).with_context(|| format!("extracting {}", doc.name))?;
    Ok((doc, rows))
}

/// One fetch → extract → map → merge → write cycle for `date`.
#[instrument(level = "info", skip(cfg))]
pub fn run(cfg: &Config, date: NaiveDate) -> Result<RunReport> {
    let (doc, rows) =
        obtain(cfg, date).with_context(|| format!("obtaining document for {}", date))?;
    let obs = observe(date, rows);

    let store = SeriesStore::new(&cfg.series_dir);
    let report = RunReport {
        date,
        document: doc.name,
        observed: obs.len(),
        categories: apply(&store, &obs),
    };

    let failed = report.failures().count();
    if failed > 0 {
        return Err(anyhow!(
            "{} of {} series failed to update for {}",
            failed,
            report.categories.len(),
            date
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::series::Series;
    use crate::test_support::{init_test_logging, reckoner_pdf, spawn_server};
    use std::{fs, path::Path, sync::atomic::Ordering};
    use tempfile::tempdir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn rows(text: &str) -> TableRows {
        TableRows::from_text("test", text).unwrap()
    }

    const FULL_SHEET: &str = "\
Product Grade Price (Rs./MT)

EC Grade Wire Rod 9.5mm 2,61,500

Alloy Wire Rod 9.5mm 2,70,000

Wire Rod 12mm 2,58,000

Billets 6063 2,52,000

T-Ingot P1020 2,44,000

Sows P1020 2,38,250

Ingots P1020 2,40,750
";

    fn served_config(root: &Path, base: String) -> Config {
        Config {
            archive_dir: root.join("pdfs"),
            series_dir: root.join("csv"),
            base_urls: vec![base],
            max_retries: 0,
            attempt_pause_ms: 0,
            min_document_bytes: 16,
            ..Config::default()
        }
    }

    #[test]
    fn malformed_price_drops_only_that_row() {
        init_test_logging();
        let text = FULL_SHEET.replace("Billets 6063 2,52,000", "Billets | 6063 | on request");
        let obs = observe(d(10), rows(&text));
        assert_eq!(obs.len(), 6);
        assert_eq!(obs.get(Category::Billet), None);
        assert_eq!(obs.get(Category::Sow), Some(238250.0));
    }

    #[test]
    fn alloy_row_never_lands_in_plain_wire_rod() {
        let obs = observe(d(10), rows("Alloy Wire Rods 9.5mm 2,70,000\n"));
        assert_eq!(obs.get(Category::AlloyWireRod), Some(270000.0));
        assert_eq!(obs.get(Category::WireRod), None);
    }

    #[test]
    fn first_row_per_category_wins() {
        let obs = observe(
            d(10),
            rows("Sows P1020 2,38,250\n\nSows P0610 2,35,000\n"),
        );
        assert_eq!(obs.len(), 1);
        assert_eq!(obs.get(Category::Sow), Some(238250.0));
    }

    #[test]
    fn missing_category_is_backfilled_or_left_alone() -> anyhow::Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let store = SeriesStore::new(dir.path());

        // day 1: everything but sows; sows already has history, billets not
        let mut sows = Series::new(Category::Sow);
        sows.merge(Some(230000.0), d(7));
        store.save(&sows)?;

        let text: String = FULL_SHEET
            .lines()
            .filter(|l| !l.starts_with("Sows") && !l.starts_with("Billets"))
            .map(|l| format!("{}\n", l))
            .collect();
        let obs = observe(d(10), rows(&text));
        assert_eq!(obs.len(), 5);

        let results = apply(&store, &obs);
        assert!(results.iter().all(|r| r.outcome.is_ok()));

        let sows = store.load(Category::Sow)?;
        assert_eq!(sows.len(), 4);
        assert_eq!(sows.rate_on(d(10)), Some(230000.0));
        assert!(sows.is_contiguous());

        assert!(!store.path(Category::Billet).exists());
        assert_eq!(
            store.load(Category::Ingot)?.rate_on(d(10)),
            Some(240750.0)
        );
        Ok(())
    }

    #[test]
    fn applying_twice_is_idempotent() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SeriesStore::new(dir.path());
        let obs = observe(d(10), rows(FULL_SHEET));

        apply(&store, &obs);
        let first: Vec<String> = categories::ALL
            .iter()
            .map(|c| fs::read_to_string(store.path(*c)))
            .collect::<std::io::Result<_>>()?;

        let again = apply(&store, &obs);
        assert!(again
            .iter()
            .all(|r| matches!(r.outcome, Ok(MergeOutcome::AlreadyCurrent))));
        let second: Vec<String> = categories::ALL
            .iter()
            .map(|c| fs::read_to_string(store.path(*c)))
            .collect::<std::io::Result<_>>()?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn broken_series_file_does_not_block_others() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SeriesStore::new(dir.path());
        fs::write(store.path(Category::Billet), "date,rate\nyesterday,1\n")?;

        let results = apply(&store, &observe(d(10), rows(FULL_SHEET)));
        let failed: Vec<Category> = results
            .iter()
            .filter(|r| r.outcome.is_err())
            .map(|r| r.category)
            .collect();
        assert_eq!(failed, vec![Category::Billet]);
        assert_eq!(store.load(Category::Sow)?.len(), 1);
        Ok(())
    }

    #[test]
    fn real_document_is_fetched_archived_and_merged() -> anyhow::Result<()> {
        init_test_logging();
        let body = reckoner_pdf();
        let (base, _) = spawn_server("-10-mar-2025.pdf", body.clone())?;
        let dir = tempdir()?;
        let cfg = served_config(dir.path(), base);

        let report = run(&cfg, d(10))?;
        assert_eq!(report.observed, 6);

        let store = SeriesStore::new(&cfg.series_dir);
        assert_eq!(
            store.load(Category::AlloyWireRod)?.rate_on(d(10)),
            Some(270000.0)
        );
        assert_eq!(store.load(Category::EcWireRod)?.rate_on(d(10)), Some(261500.0));
        assert!(!store.path(Category::WireRod).exists());

        let archived = Locator::new(&cfg.archive_dir, 16).archive_path(d(10));
        assert_eq!(fs::read(archived)?, body);
        Ok(())
    }

    #[test]
    fn unreadable_archive_is_fetched_again() -> anyhow::Result<()> {
        init_test_logging();
        let body = reckoner_pdf();
        let (base, hits) = spawn_server("-10-mar-2025.pdf", body.clone())?;
        let dir = tempdir()?;
        let cfg = served_config(dir.path(), base);

        // a PDF header with nothing readable behind it, as left by a cut-off write
        let path = Locator::new(&cfg.archive_dir, 16).archive_path(d(10));
        fs::create_dir_all(path.parent().unwrap())?;
        let mut damaged = b"%PDF-1.4\n".to_vec();
        damaged.extend(vec![b'0'; 2048]);
        fs::write(&path, &damaged)?;

        let report = run(&cfg, d(10))?;
        assert_eq!(report.observed, 6);
        assert!(hits.load(Ordering::SeqCst) >= 1);
        assert_eq!(fs::read(&path)?, body);

        // the repaired archive is used as is from now on
        let before = hits.load(Ordering::SeqCst);
        run(&cfg, d(10))?;
        assert_eq!(hits.load(Ordering::SeqCst), before);
        Ok(())
    }

    #[test]
    fn unreadable_document_aborts_before_any_series() -> anyhow::Result<()> {
        let (base, hits) = spawn_server("never-served.pdf", Vec::new())?;
        let dir = tempdir()?;
        let cfg = Config {
            min_document_bytes: 8,
            ..served_config(dir.path(), base)
        };
        let path = Locator::new(&cfg.archive_dir, 8).archive_path(d(10));
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"<html>gateway timeout</html>")?;

        let err = run(&cfg, d(10)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Unavailable { .. })
        ));
        assert!(hits.load(Ordering::SeqCst) > 0);
        assert!(!cfg.series_dir.exists());
        assert_eq!(fs::read(&path)?, b"<html>gateway timeout</html>");
        Ok(())
    }
}
