// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RECKONER_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "reckoner.yaml";

static DEFAULT_BASE_URLS: &[&str] = &[
    "https://www.hindalco.com/Upload/PDF/",
    "https://www.hindalco.com/upload/pdf/",
    "https://www.hindalco.com/Upload/Pdf/",
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the `<yyyy>/<Month>/` document archive.
    pub archive_dir: PathBuf,
    /// Directory holding one `<stem>.csv` per category.
    pub series_dir: PathBuf,
    /// Directory URLs the document name is joined onto, tried in order.
    pub base_urls: Vec<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Retries per candidate URL on transport errors.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Pause between candidate URLs.
    pub attempt_pause_ms: u64,
    /// Anything smaller is treated as a truncated download.
    pub min_document_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from("pdfs"),
            series_dir: PathBuf::from("csv_data"),
            base_urls: DEFAULT_BASE_URLS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            attempt_pause_ms: 500,
            min_document_bytes: 1000,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn attempt_pause(&self) -> Duration {
        Duration::from_millis(self.attempt_pause_ms)
    }

    /// Parse a YAML config file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve the config for this process: an explicit path wins, then
    /// `$RECKONER_CONFIG`, then `./reckoner.yaml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let cfg = match candidate {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                debug!("no config file; using defaults");
                Self::default()
            }
        };
        info!(
            archive = %cfg.archive_dir.display(),
            series = %cfg.series_dir.display(),
            "config loaded"
        );
        Ok(cfg)
    }
}
