// src/categories.rs

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use std::fmt;
use tracing::trace;

use crate::error::ParseError;
use crate::extract::{parse_price, RawRow};

/// The fixed product categories, in matching priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    EcWireRod = 1,
    AlloyWireRod = 2,
    WireRod = 3,
    Billet = 4,
    TIngot = 5,
    Sow = 6,
    Ingot = 7,
}

pub const ALL: [Category; 7] = [
    Category::EcWireRod,
    Category::AlloyWireRod,
    Category::WireRod,
    Category::Billet,
    Category::TIngot,
    Category::Sow,
    Category::Ingot,
];

const WIRE_ROD: &str = r"wire[\s-]*rods?";

/// One pattern per category, indexed like `ALL`. Signatures overlap on
/// purpose; the lowest index that matches wins.
static SIGNATURES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        format!(r"(?i)\bec[\s-]*grade\b|\bec\b.*{WIRE_ROD}|{WIRE_ROD}.*\bec\b"),
        format!(r"(?i)\balloy\b.*{WIRE_ROD}|{WIRE_ROD}.*\balloy\b"),
        format!(r"(?i){WIRE_ROD}"),
        r"(?i)\bbillets?\b".to_string(),
        r"(?i)\bt[\s-]?ingots?\b".to_string(),
        r"(?i)\bsows?\b".to_string(),
        r"(?i)ingots?\b".to_string(),
    ])
    .expect("category signatures")
});

/// Product family nouns. A row naming none of these is a sub-grade of the
/// product above it when the product cell spans several rows.
static PRODUCT_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){WIRE_ROD}|\bbillets?\b|\bt[\s-]?ingots?\b|\bsows?\b|\bingots?\b"
    ))
    .expect("product head regex")
});

/// The product family named in `label`, as written (`Wire Rods`, `T-Ingot`).
pub fn product_head(label: &str) -> Option<&str> {
    PRODUCT_HEAD.find(label).map(|m| m.as_str())
}

impl Category {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::EcWireRod => "EC grade wire rod",
            Category::AlloyWireRod => "Alloy wire rod",
            Category::WireRod => "Wire rod",
            Category::Billet => "Billets",
            Category::TIngot => "T-ingots",
            Category::Sow => "Sows",
            Category::Ingot => "Ingots",
        }
    }

    /// Series file name without extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            Category::EcWireRod => "ec_wire_rods",
            Category::AlloyWireRod => "alloy_wire_rods",
            Category::WireRod => "wire_rods",
            Category::Billet => "billets",
            Category::TIngot => "t_ingots",
            Category::Sow => "sows",
            Category::Ingot => "ingots",
        }
    }

    /// Highest-priority category whose signature appears in `text`.
    pub fn match_text(text: &str) -> Option<Self> {
        SIGNATURES
            .matches(text)
            .iter()
            .next()
            .and_then(|idx| ALL.get(idx).copied())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// What a raw row turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapped {
    Price(Category, f64),
    Unmatched,
}

/// Assign `row` to a category by its label and read its price. Rows that
/// match nothing are `Unmatched`; matched rows with a bad price are errors.
pub fn map(row: &RawRow) -> Result<Mapped, ParseError> {
    let label = row.label();
    let Some(category) = Category::match_text(&label) else {
        trace!(line = row.line, %label, "unmatched row");
        return Ok(Mapped::Unmatched);
    };
    let price = parse_price(row.price_cell().unwrap_or_default())?;
    Ok(Mapped::Price(category, price))
}
