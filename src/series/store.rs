// src/series/store.rs

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Point, Series};
use crate::categories::Category;

/// Per-category `date,rate` CSV files under one directory.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    dir: PathBuf,
}

impl SeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.csv", category.file_stem()))
    }

    /// Load a category's series; a missing file is an empty series.
    pub fn load(&self, category: Category) -> Result<Series> {
        let path = self.path(category);
        if !path.exists() {
            debug!(%category, "no series file yet");
            return Ok(Series::new(category));
        }

        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut points = Vec::new();
        for (idx, record) in rdr.deserialize::<Point>().enumerate() {
            let point = record
                .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
            points.push(point);
        }

        Series::from_points(category, points).map_err(|date| {
            anyhow!(
                "{} is not strictly ascending by date (at {})",
                path.display(),
                date
            )
        })
    }

    /// Rewrite the whole file. Goes through a temp file in the same
    /// directory so readers never see a partial series.
    pub fn save(&self, series: &Series) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating series directory {}", self.dir.display()))?;
        let path = self.path(series.category);

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("creating temp file in {}", self.dir.display()))?;
        {
            let mut wtr = WriterBuilder::new().has_headers(true).from_writer(&mut tmp);
            for point in series.points() {
                wtr.serialize(point)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            wtr.flush()
                .with_context(|| format!("flushing {}", path.display()))?;
        }
        tmp.persist(&path)
            .with_context(|| format!("replacing {}", path.display()))?;

        debug!(category = %series.category, rows = series.len(), "saved series");
        Ok(())
    }
}
