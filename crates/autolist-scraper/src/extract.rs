//! Embedded payload extraction from HTML listing pages.
//!
//! Listing pages hydrate client state from a single
//! `<script type="application/json">` element. Only the first such element is
//! read; later ones are ignored even when the first is unusable, so a given
//! page always yields the same result.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::envelope::{read_count, COUNT_KEYS};
use crate::error::ExtractionError;

static JSON_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*?\stype\s*=\s*["']?application/json["']?[^>]*>(.*?)</script\s*>"#,
    )
    .expect("valid regex")
});

/// Location of the listings array inside the hydration payload.
const LISTINGS_PATH: [&str; 3] = ["props", "pageProps", "listings"];

/// Listings recovered from an HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedPayload {
    pub listings: Vec<Value>,
    /// Upstream total result count, when the page reports one.
    pub total_count: Option<i64>,
}

/// Pulls the listings collection out of the first JSON script element in
/// `html`.
///
/// # Errors
///
/// - [`ExtractionError::NotFound`] when the page has no JSON script element.
/// - [`ExtractionError::MalformedPayload`] when the element's content does not
///   parse after entity decoding, or the listings path is missing or not an
///   array.
pub fn extract_embedded_payload(html: &str) -> Result<EmbeddedPayload, ExtractionError> {
    let captured = JSON_SCRIPT_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .ok_or(ExtractionError::NotFound)?;
    let captured_len = captured.len();

    let decoded = decode_html_entities(captured);
    let root: Value =
        serde_json::from_str(&decoded).map_err(|e| ExtractionError::MalformedPayload {
            captured_len,
            reason: e.to_string(),
        })?;

    let mut node = &root;
    for (depth, segment) in LISTINGS_PATH.iter().enumerate() {
        node = node
            .get(segment)
            .ok_or_else(|| ExtractionError::MalformedPayload {
                captured_len,
                reason: format!("missing `{}`", LISTINGS_PATH[..=depth].join(".")),
            })?;
    }

    let Value::Array(listings) = node else {
        return Err(ExtractionError::MalformedPayload {
            captured_len,
            reason: format!("`{}` is not an array", LISTINGS_PATH.join(".")),
        });
    };

    let total_count = root
        .get("props")
        .and_then(|p| p.get("pageProps"))
        .and_then(|p| read_count(p, &COUNT_KEYS));

    Ok(EmbeddedPayload {
        listings: listings.clone(),
        total_count,
    })
}

/// Undoes the attribute-safe escaping the site applies to embedded JSON.
/// `&amp;` is decoded last so `&amp;quot;` becomes `&quot;`, not `"`.
pub(crate) fn decode_html_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#x22;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
