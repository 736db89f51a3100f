//! Shapes exchanged between the upstream client, the classifier and the
//! pipeline.
//!
//! ## Observed upstream channels
//!
//! ### REST search (`GET /api/search`)
//! Returns `application/json` with a `listings` array and, usually, a
//! `totalCount`. Each listing is flat: `title`, `price` (already formatted as
//! `"$30,000"`), `location`, `mileage`, `url` (site-relative), `imageUrl`,
//! `year`, `make`, `model`.
//!
//! ### POST search (`POST /api/search`)
//! Same parameters in a JSON body. Responses use a `results` array of nested
//! records (`vehicle` / `price` / `location` sub-objects).
//!
//! ### HTML pages
//! Served as `text/html` even when the REST endpoint is blocked. The listings
//! live in a `<script type="application/json">` hydration payload under
//! `props.pageProps.listings`. Content-type headers are not reliable on any
//! channel; some JSON responses arrive as `text/plain`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// An upstream response as handed back by the fetch layer.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// One unit of pipeline input: a structured record, or an HTML page body that
/// still needs its embedded payload extracted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFragment {
    Structured(Value),
    Html(String),
}

/// Which upstream channel to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Rest,
    Search,
    Page,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Rest => write!(f, "rest"),
            Channel::Search => write!(f, "search"),
            Channel::Page => write!(f, "page"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" => Ok(Channel::Rest),
            "search" => Ok(Channel::Search),
            "page" => Ok(Channel::Page),
            other => Err(format!(
                "unknown channel \"{other}\" (expected rest, search or page)"
            )),
        }
    }
}

/// Search parameters for the REST and POST channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub postal_code: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    /// Query-string pairs for `GET /api/search`, fixed filters first.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dealerId", "-1".to_string()),
            ("priceFrom", "0".to_string()),
            ("priceTo", "999999".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("sort", "age".to_string()),
            ("radius", "1000".to_string()),
            ("postalCode", self.postal_code.clone()),
            ("page", self.page.to_string()),
        ]
    }

    /// JSON body for `POST /api/search`.
    #[must_use]
    pub fn json_body(&self) -> Value {
        json!({
            "dealerId": -1,
            "priceFrom": 0,
            "priceTo": 999_999,
            "pageSize": self.page_size,
            "sort": "age",
            "radius": 1000,
            "postalCode": self.postal_code,
            "page": self.page,
        })
    }
}
