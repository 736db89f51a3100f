use serde::{Deserialize, Serialize};

/// A vehicle listing in canonical form, independent of which upstream
/// response shape produced it.
///
/// Every field except `identity_url` is best-effort. Absence is `None`, never
/// an empty string or zero, so "unknown" stays distinguishable from "empty".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Listing {
    /// Canonical absolute URL of the listing detail page, e.g.
    /// `"https://www.autotrader.ca/a/honda/civic/london/ontario/5_123"`.
    /// This is the deduplication key; a listing without one is never stored.
    pub identity_url: Option<String>,
    /// Upstream title, or `"{year} {make} {model}"` when none was supplied.
    pub title: Option<String>,
    /// Price exactly as displayed upstream, e.g. `"$30,000"`. Not parsed.
    pub price_display: Option<String>,
    pub city: Option<String>,
    pub mileage_km: Option<i64>,
    /// First image when the source offers several.
    pub image_url: Option<String>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl Listing {
    /// Returns `true` when the listing carries an identity and can be persisted.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.identity_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Joins year, make and model with single spaces, skipping absent or blank
/// parts. Returns `None` when nothing remains.
#[must_use]
pub fn compose_title(year: Option<i32>, make: Option<&str>, model: Option<&str>) -> Option<String> {
    let year = year.map(|y| y.to_string());
    let parts: Vec<&str> = [year.as_deref(), make, model]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
