// src/error.rs

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Retrieval of the day's document failed. Aborts the run before any series is touched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("invalid base URL {url}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("building candidate URL {url}")]
    CandidateUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no document available for {date} after trying {tried} URLs")]
    Unavailable { date: NaiveDate, tried: usize },

    #[error("archiving document to {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The document holds nothing we can read a table out of.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not a PDF")]
    NotPdf { name: String },

    #[error("extracting text from {name}: {message}")]
    Text { name: String, message: String },

    #[error("no tabular region found in {name}")]
    NoTable { name: String },
}

/// A single row's price token could not be read. Only that row is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unreadable price {token:?}: {reason}")]
pub struct ParseError {
    pub token: String,
    pub reason: &'static str,
}
