// src/locate/names.rs

use chrono::{Datelike, NaiveDate};

pub const STEM: &str = "primary-ready-reckoner";

/// Stems the publisher has used besides the canonical one.
static ALT_STEMS: &[&str] = &["ready-reckoner", "primary-reckoner", "primary-rates"];

/// `primary-ready-reckoner-19-oct-2026`
pub fn canonical_name(date: NaiveDate) -> String {
    format!("{}-{}", STEM, date.format("%d-%b-%Y")).to_lowercase()
}

/// Archive subdirectory for `date`, e.g. `2026/October`.
pub fn month_dir(date: NaiveDate) -> String {
    date.format("%Y/%B").to_string()
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Every identifier the document for `date` may be published under, canonical first.
pub fn name_variants(date: NaiveDate) -> Vec<String> {
    let day = date.day();
    let year = date.year();
    let mon = date.format("%b").to_string().to_lowercase();
    let month = date.format("%B").to_string().to_lowercase();
    let num = date.format("%m").to_string();
    let suffix = ordinal_suffix(day);

    let candidates = [
        canonical_name(date),
        format!("{STEM}-{day}-{mon}-{year}"),
        format!("{STEM}-{day}{suffix}-{mon}-{year}"),
        format!("{STEM}-{day:02}-{month}-{year}"),
        format!("{STEM}-{day:02}-{num}-{year}"),
        format!("{STEM}-{day:02}_{mon}_{year}"),
        format!("{}_{day:02}_{mon}_{year}", STEM.replace('-', "_")),
    ];

    let mut out: Vec<String> = Vec::with_capacity(candidates.len() + ALT_STEMS.len());
    let alts = ALT_STEMS
        .iter()
        .map(|stem| format!("{stem}-{day:02}-{mon}-{year}"));
    for name in candidates.into_iter().chain(alts) {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn canonical_is_zero_padded_lowercase() {
        assert_eq!(canonical_name(d(2025, 6, 3)), "primary-ready-reckoner-03-jun-2025");
        assert_eq!(canonical_name(d(2026, 10, 19)), "primary-ready-reckoner-19-oct-2026");
    }

    #[test]
    fn month_dir_uses_full_month_name() {
        assert_eq!(month_dir(d(2025, 9, 1)), "2025/September");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn variants_start_with_canonical_and_are_unique() {
        let date = d(2025, 6, 3);
        let names = name_variants(date);
        assert_eq!(names[0], canonical_name(date));
        assert!(names.contains(&"primary-ready-reckoner-3-jun-2025".to_string()));
        assert!(names.contains(&"primary-ready-reckoner-3rd-jun-2025".to_string()));
        assert!(names.contains(&"primary-ready-reckoner-03-june-2025".to_string()));
        assert!(names.contains(&"primary-ready-reckoner-03-06-2025".to_string()));
        assert!(names.contains(&"primary_ready_reckoner_03_jun_2025".to_string()));
        assert!(names.contains(&"primary-rates-03-jun-2025".to_string()));

        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn two_digit_day_collapses_unpadded_variant() {
        let names = name_variants(d(2025, 6, 21));
        let padded = names
            .iter()
            .filter(|n| *n == "primary-ready-reckoner-21-jun-2025")
            .count();
        assert_eq!(padded, 1);
        assert!(names.contains(&"primary-ready-reckoner-21st-jun-2025".to_string()));
    }
}
