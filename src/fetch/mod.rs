// src/fetch/mod.rs

use chrono::NaiveDate;
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE},
    StatusCode,
};
use std::{fs, io::Write, path::Path, thread, time::Duration};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::document::{has_pdf_magic, Document};
use crate::error::FetchError;
use crate::locate::canonical_name;

pub mod urls;

pub use urls::candidate_urls;

/// Longest pause between retries of one URL.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Delay before retry `attempt` (1-based): `initial * 2^(attempt - 1)`, capped.
fn backoff_ms(initial: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| initial.checked_mul(factor))
        .map_or(MAX_BACKOFF_MS, |ms| ms.min(MAX_BACKOFF_MS))
}

/// Result of one GET against one candidate URL.
#[derive(Debug)]
enum Attempt {
    Document(Vec<u8>),
    Rejected(String),
}

/// Downloads the day's document from the publisher, blocking.
pub struct Fetcher {
    client: Client,
    base_urls: Vec<String>,
    max_retries: u32,
    initial_backoff_ms: u64,
    pause: Duration,
    min_bytes: u64,
}

impl Fetcher {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        for base in &cfg.base_urls {
            Url::parse(base).map_err(|source| FetchError::BaseUrl {
                url: base.clone(),
                source,
            })?;
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/pdf,application/octet-stream,*/*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .timeout(cfg.timeout())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_urls: cfg.base_urls.clone(),
            max_retries: cfg.max_retries,
            initial_backoff_ms: cfg.retry_backoff_ms,
            pause: cfg.attempt_pause(),
            min_bytes: cfg.min_document_bytes,
        })
    }

    fn get_core(&self, url: &Url) -> reqwest::Result<Attempt> {
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        if !status.is_success() {
            if status.is_server_error() {
                resp.error_for_status()?;
            }
            return Ok(Attempt::Rejected(format!("HTTP {}", status)));
        }

        let bytes = resp.bytes()?;
        if !has_pdf_magic(&bytes) {
            return Ok(Attempt::Rejected("body is not a PDF".to_string()));
        }
        if (bytes.len() as u64) < self.min_bytes {
            return Ok(Attempt::Rejected(format!("body only {} bytes", bytes.len())));
        }
        Ok(Attempt::Document(bytes.to_vec()))
    }

    /// Transport errors and 5xx are retried with exponential backoff;
    /// a definite answer (4xx, wrong content) is not.
    fn get_with_retry(&self, url: &Url) -> Option<Vec<u8>> {
        let mut attempts = 0;
        loop {
            match self.get_core(url) {
                Ok(Attempt::Document(bytes)) => return Some(bytes),
                Ok(Attempt::Rejected(reason)) => {
                    debug!(%url, %reason, "candidate rejected");
                    return None;
                }
                Err(e) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = backoff_ms(self.initial_backoff_ms, attempts);
                    warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    thread::sleep(Duration::from_millis(backoff));
                }
                Err(e) => {
                    warn!(%url, error = %e, "Exhausted retries");
                    return None;
                }
            }
        }
    }

    /// Try every candidate URL for `date` and archive the first real PDF at `dest`.
    #[instrument(level = "info", skip(self, dest), fields(dest = %dest.display()))]
    pub fn fetch(&self, date: NaiveDate, dest: &Path) -> Result<Document, FetchError> {
        let candidates = candidate_urls(&self.base_urls, date)?;
        let total = candidates.len();

        for (i, url) in candidates.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
            debug!(%url, attempt = i + 1, total, "trying candidate");
            let Some(bytes) = self.get_with_retry(url) else {
                continue;
            };

            archive(dest, &bytes)?;
            info!(%url, size = bytes.len(), "downloaded document");

            return Ok(Document {
                date,
                name: canonical_name(date),
                bytes,
            });
        }

        Err(FetchError::Unavailable { date, tried: total })
    }

    /// `HEAD` a URL, returning its status and advertised length.
    pub fn probe(&self, url: &Url) -> reqwest::Result<(StatusCode, Option<u64>)> {
        let resp = self.client.head(url.clone()).send()?;
        Ok((resp.status(), resp.content_length()))
    }

    pub fn candidates(&self, date: NaiveDate) -> Result<Vec<Url>, FetchError> {
        candidate_urls(&self.base_urls, date)
    }
}

/// Write `bytes` to `dest` through a temp file in the same directory, so
/// an interrupted write never leaves a partial document at `dest`.
fn archive(dest: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| FetchError::Archive { path, source }
    };

    fs::create_dir_all(parent).map_err(io_err(parent))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err(parent))?;
    tmp.write_all(bytes).map_err(io_err(dest))?;
    tmp.as_file().sync_all().map_err(io_err(dest))?;
    tmp.persist(dest).map_err(|e| FetchError::Archive {
        path: dest.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
