// src/extract/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::panic;
use tracing::{debug, instrument, trace};

use crate::categories::product_head;
use crate::document::Document;
use crate::error::ExtractionError;

pub mod price;

pub use price::{clean_str, looks_numeric, parse_price};

/// Explicit column breaks: tabs, ruled `|` borders, or wide gaps when the
/// text layer keeps them. Plain extracted text separates cells with one space.
static CELL_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t|\|").expect("cell regex"));

/// A label followed by a single-space-separated price (3+ digits, so `Page 2` stays prose).
static TRAILING_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<label>.*?[a-z].*?)\s+(?P<price>(?:₹|rs\.?|inr|\$)?\s*\d[\d,]{2,}(?:\.\d+)?(?:\s*(?:/|per\s+)?\s*(?:mt|t|kg))?)$",
    )
    .expect("trailing price regex")
});

/// Longest label a continuation row may carry on its own (`EC Grade`, `Alloy 9.5mm`).
const MAX_SUB_GRADE_WORDS: usize = 3;

/// One line of a table, split into cells. The last cell holds the price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the extracted text.
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    /// Every cell but the last, joined with single spaces.
    pub fn label(&self) -> String {
        match self.cells.split_last() {
            Some((_, rest)) => rest.join(" "),
            None => String::new(),
        }
    }

    pub fn price_cell(&self) -> Option<&str> {
        self.cells.last().map(String::as_str)
    }
}

/// Lazily yields the tabular rows of a document's text, in document order.
/// Consumed once; extract again to re-read.
#[derive(Debug)]
pub struct TableRows {
    lines: std::iter::Enumerate<std::vec::IntoIter<String>>,
    /// Product family of the row above, for rows under a merged product cell.
    carry: Option<String>,
}

impl TableRows {
    /// Split extracted text into rows. Fails if no line has at least two cells.
    pub fn from_text(name: &str, text: &str) -> Result<Self, ExtractionError> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();

        let tabular = lines.iter().filter(|l| split_cells(l).len() >= 2).count();
        if tabular == 0 {
            return Err(ExtractionError::NoTable {
                name: name.to_string(),
            });
        }
        debug!(name, lines = lines.len(), tabular, "located tabular region");

        Ok(Self {
            lines: lines.into_iter().enumerate(),
            carry: None,
        })
    }
}

impl Iterator for TableRows {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        for (idx, line) in self.lines.by_ref() {
            if let Some(cells) = row_cells(&mut self.carry, &line) {
                trace!(line = idx + 1, ?cells, "row");
                return Some(RawRow {
                    line: idx + 1,
                    cells,
                });
            }
        }
        None
    }
}

/// Split one text line into cells, trimming each and dropping empties.
pub fn split_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = CELL_SEP
        .split(line)
        .map(clean_str)
        .filter(|c| !c.is_empty())
        .collect();

    if cells.len() == 1 {
        if let Some(caps) = TRAILING_PRICE.captures(&cells[0]) {
            cells = vec![caps["label"].trim().to_string(), caps["price"].trim().to_string()];
        }
    }
    cells
}

/// Turn a line into a row, resolving merged product cells. The text layer
/// prints a merged cell once, on its first row; the rows below it come out
/// as a bare sub-grade (`Alloy 2,70,000`) or a bare price. Those inherit the
/// product family of the row above. Blank lines keep the family; headings
/// and rows about something else drop it.
fn row_cells(carry: &mut Option<String>, line: &str) -> Option<Vec<String>> {
    let mut cells = split_cells(line);

    match cells.len() {
        0 => return None,
        1 if looks_numeric(&cells[0]) => {
            let product = carry.clone()?;
            cells.insert(0, product);
            return Some(cells);
        }
        1 => {
            // a heading, or a merged product cell printed on its own line
            *carry = product_head(&cells[0]).map(str::to_string);
            return None;
        }
        _ => {}
    }

    let label = cells[..cells.len() - 1].join(" ");
    if let Some(head) = product_head(&label) {
        *carry = Some(head.to_string());
    } else if label.split_whitespace().count() <= MAX_SUB_GRADE_WORDS {
        if let Some(product) = carry.as_ref() {
            cells.insert(0, product.clone());
        }
    } else {
        *carry = None;
    }
    Some(cells)
}

/// Read the document's text and return its tabular rows.
#[instrument(level = "info", skip(doc), fields(name = %doc.name))]
pub fn extract(doc: &Document) -> Result<TableRows, ExtractionError> {
    if !doc.looks_like_pdf() {
        return Err(ExtractionError::NotPdf {
            name: doc.name.clone(),
        });
    }

    // pdf-extract panics on some malformed font tables
    let bytes = &doc.bytes;
    let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractionError::Text {
            name: doc.name.clone(),
            message: "PDF parser panicked".to_string(),
        })?
        .map_err(|e| ExtractionError::Text {
            name: doc.name.clone(),
            message: e.to_string(),
        })?;

    debug!(chars = text.len(), lines = text.lines().count(), "extracted text");
    TableRows::from_text(&doc.name, &text)
}
