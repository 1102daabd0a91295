// src/extract/price.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

static CURRENCY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:₹|rs\.?|inr|\$)\s*").expect("currency prefix regex"));

static UNIT_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:/|per\s+)?\s*(?:mt|tonne|ton|t|kg)\.?$").expect("unit suffix regex")
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("number regex"));

/// Trim whitespace and strip a pair of outer quotes.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read a price cell such as `Rs. 2,61,500 /MT` as `261500.0`.
pub fn parse_price(token: &str) -> Result<f64, ParseError> {
    let fail = |reason| ParseError {
        token: token.to_string(),
        reason,
    };

    let cleaned = clean_str(token);
    let without_currency = CURRENCY_PREFIX.replace(&cleaned, "");
    let without_unit = UNIT_SUFFIX.replace(without_currency.trim(), "");
    let digits: String = without_unit
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Err(fail("empty"));
    }
    if !NUMBER.is_match(&digits) {
        return Err(fail("not a number"));
    }
    let value: f64 = digits.parse().map_err(|_| fail("not a number"))?;
    if !value.is_finite() {
        return Err(fail("not finite"));
    }
    Ok(value)
}

/// Whether a cell reads as a price; used to spot tabular lines.
pub fn looks_numeric(token: &str) -> bool {
    parse_price(token).is_ok()
}
