// src/locate/mod.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use glob::{glob, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::document::DocumentRef;

pub mod names;

pub use names::{canonical_name, month_dir, name_variants};

pub const EXTENSION: &str = "pdf";

/// Result of looking for a date's document in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(DocumentRef),
    /// Not archived yet; `archive_path` is where a fetch should put it.
    NotFound { name: String, archive_path: PathBuf },
}

/// Maps dates onto the `<archive>/<yyyy>/<Month>/<name>.pdf` layout.
#[derive(Debug, Clone)]
pub struct Locator {
    archive_dir: PathBuf,
    min_bytes: u64,
}

impl Locator {
    pub fn new(archive_dir: impl Into<PathBuf>, min_bytes: u64) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            min_bytes,
        }
    }

    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.archive_dir
            .join(month_dir(date))
            .join(format!("{}.{}", canonical_name(date), EXTENSION))
    }

    /// Look up the document for `date`. Checks the dated layout first, then
    /// anywhere under the archive root (older runs stored documents flat).
    pub fn locate(&self, date: NaiveDate) -> Result<Located> {
        let name = canonical_name(date);
        let archive_path = self.archive_path(date);

        if self.usable(&archive_path) {
            debug!(path = %archive_path.display(), "found archived document");
            return Ok(Located::Found(DocumentRef {
                date,
                name,
                path: archive_path,
            }));
        }

        let pattern = format!(
            "{}/**/{}.{}",
            Pattern::escape(&self.archive_dir.to_string_lossy()),
            name,
            EXTENSION
        );
        for entry in glob(&pattern).with_context(|| format!("invalid glob {}", pattern))? {
            let Ok(path) = entry else { continue };
            if path != archive_path && self.usable(&path) {
                debug!(path = %path.display(), "found document outside dated layout");
                return Ok(Located::Found(DocumentRef { date, name, path }));
            }
        }

        Ok(Located::NotFound { name, archive_path })
    }

    fn usable(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() >= self.min_bytes => true,
            Ok(meta) if meta.is_file() => {
                warn!(
                    path = %path.display(),
                    size = meta.len(),
                    "archived document too small; treating as missing"
                );
                false
            }
            _ => false,
        }
    }
}
