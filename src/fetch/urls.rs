// src/fetch/urls.rs

use chrono::NaiveDate;
use url::Url;

use crate::error::FetchError;
use crate::locate::{name_variants, EXTENSION};

/// Every URL the document for `date` may live at: each name variant under
/// each base, canonical name first across all bases.
pub fn candidate_urls(base_urls: &[String], date: NaiveDate) -> Result<Vec<Url>, FetchError> {
    let bases = base_urls
        .iter()
        .map(|b| {
            // `join` drops the last segment unless the base ends with a slash
            let b = if b.ends_with('/') { b.clone() } else { format!("{}/", b) };
            Url::parse(&b).map_err(|source| FetchError::BaseUrl { url: b, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(bases.len() * 12);
    for name in name_variants(date) {
        let file = format!("{}.{}", name, EXTENSION);
        for base in &bases {
            let url = base.join(&file).map_err(|source| FetchError::CandidateUrl {
                url: format!("{}{}", base, file),
                source,
            })?;
            out.push(url);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    #[test]
    fn canonical_names_come_first_for_every_base() -> Result<()> {
        let bases = vec![
            "https://example.com/Upload/PDF/".to_string(),
            "https://example.com/upload/pdf".to_string(),
        ];
        let urls = candidate_urls(&bases, date())?;

        assert_eq!(
            urls[0].as_str(),
            "https://example.com/Upload/PDF/primary-ready-reckoner-03-jun-2025.pdf"
        );
        assert_eq!(
            urls[1].as_str(),
            "https://example.com/upload/pdf/primary-ready-reckoner-03-jun-2025.pdf"
        );
        assert_eq!(urls.len(), name_variants(date()).len() * 2);
        Ok(())
    }

    #[test]
    fn bad_base_is_an_error() {
        assert!(matches!(
            candidate_urls(&["not a url".to_string()], date()),
            Err(FetchError::BaseUrl { .. })
        ));
    }

    #[test]
    fn base_that_cannot_hold_paths_is_an_error() {
        assert!(matches!(
            candidate_urls(&["mailto:rates@example.com".to_string()], date()),
            Err(FetchError::CandidateUrl { .. })
        ));
    }
}
