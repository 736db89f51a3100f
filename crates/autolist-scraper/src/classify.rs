//! Response classification: structured JSON vs. HTML needing extraction.

use serde_json::Value;

use crate::types::{RawFragment, RawResponse};

/// Decides whether an upstream response is directly usable structured data or
/// an HTML document that still needs its embedded payload extracted.
///
/// The declared content type is only a hint. Anything that parses as JSON is
/// structured; everything else, including JSON-labelled bodies that do not
/// parse, is handed on as HTML so the extractor can report a typed error.
#[must_use]
pub fn classify(response: RawResponse) -> RawFragment {
    let declared_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

    if declared_json || looks_like_json(&response.body) {
        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => return RawFragment::Structured(value),
            Err(e) if declared_json => {
                tracing::warn!(
                    content_type = response.content_type.as_deref().unwrap_or_default(),
                    error = %e,
                    "response declared JSON but did not parse; treating as HTML"
                );
            }
            Err(_) => {}
        }
    }

    RawFragment::Html(response.body)
}

fn looks_like_json(body: &str) -> bool {
    matches!(body.trim_start().as_bytes().first(), Some(b'{' | b'['))
}
