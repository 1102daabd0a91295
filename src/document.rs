// src/document.rs

use chrono::NaiveDate;
use std::{fs, path::PathBuf};

use crate::error::ExtractionError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// A document sitting in the archive, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub date: NaiveDate,
    /// Identifier derived from the date, without extension.
    pub name: String,
    pub path: PathBuf,
}

impl DocumentRef {
    pub fn read(&self) -> Result<Document, ExtractionError> {
        let bytes = fs::read(&self.path).map_err(|source| ExtractionError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(Document {
            date: self.date,
            name: self.name.clone(),
            bytes,
        })
    }
}

/// One day's published price list. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct Document {
    pub date: NaiveDate,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn looks_like_pdf(&self) -> bool {
        has_pdf_magic(&self.bytes)
    }
}

pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}
