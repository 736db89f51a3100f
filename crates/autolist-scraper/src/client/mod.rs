//! HTTP client for the marketplace's listing channels.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::error::ScraperError;
use crate::types::{Channel, RawResponse, SearchQuery};

const SEARCH_PATH: &str = "/api/search";
pub const DEFAULT_PAGE_PATH: &str = "/cars/";

/// Upper bound on connection setup, independent of the overall request timeout.
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fetches raw responses from the REST, POST-search and HTML channels.
///
/// The client only moves bytes: it does not interpret bodies or retry. Any
/// non-2xx status, timeout or connection failure comes back as a typed
/// [`ScraperError`] for the caller to treat as fatal.
pub struct AutotraderClient {
    client: Client,
    base_url: String,
}

impl AutotraderClient {
    /// Creates a client for the site at `base_url` (scheme + host, no
    /// trailing path).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ClientBuild`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(
                timeout_secs.min(MAX_CONNECT_TIMEOUT_SECS),
            ))
            .user_agent(user_agent)
            .build()
            .map_err(ScraperError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches from whichever channel `channel` names. `page_path` is only
    /// used by [`Channel::Page`] and defaults to [`DEFAULT_PAGE_PATH`].
    ///
    /// # Errors
    ///
    /// See [`AutotraderClient::fetch_listings`].
    pub async fn fetch(
        &self,
        channel: Channel,
        query: &SearchQuery,
        page_path: Option<&str>,
    ) -> Result<RawResponse, ScraperError> {
        match channel {
            Channel::Rest => self.fetch_listings(query).await,
            Channel::Search => self.search(query).await,
            Channel::Page => {
                self.fetch_page(page_path.unwrap_or(DEFAULT_PAGE_PATH), query)
                    .await
            }
        }
    }

    /// `GET /api/search` with the query as URL parameters.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UpstreamTimeout`] if the request exceeded the timeout.
    /// - [`ScraperError::UpstreamUnavailable`] on a connection or TLS failure.
    /// - [`ScraperError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ScraperError::InvalidUrl`] if the base URL cannot form a request URL.
    pub async fn fetch_listings(&self, query: &SearchQuery) -> Result<RawResponse, ScraperError> {
        let url = self.url_with_query(SEARCH_PATH, &query.query_pairs())?;
        let request = self
            .client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        self.send(request, url.as_str()).await
    }

    /// `POST /api/search` with the query as a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`AutotraderClient::fetch_listings`].
    pub async fn search(&self, query: &SearchQuery) -> Result<RawResponse, ScraperError> {
        let url = self.url_with_query(SEARCH_PATH, &[])?;
        let request = self
            .client
            .post(url.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&query.json_body());
        self.send(request, url.as_str()).await
    }

    /// `GET {path}` for an HTML results page, located and paged by `query`.
    ///
    /// # Errors
    ///
    /// Same as [`AutotraderClient::fetch_listings`].
    pub async fn fetch_page(
        &self,
        path: &str,
        query: &SearchQuery,
    ) -> Result<RawResponse, ScraperError> {
        let url = self.url_with_query(path, &page_query_pairs(query))?;
        let request = self
            .client
            .get(url.as_str())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-CA,en;q=0.9");
        self.send(request, url.as_str()).await
    }

    fn url_with_query(
        &self,
        path: &str,
        pairs: &[(&str, String)],
    ) -> Result<reqwest::Url, ScraperError> {
        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        let raw = format!("{}{path}", self.base_url);
        let mut url = reqwest::Url::parse(&raw).map_err(|e| ScraperError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<RawResponse, ScraperError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&e, url))?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "upstream returned non-success status");
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, url))?;

        tracing::debug!(
            url,
            status = status.as_u16(),
            content_type = content_type.as_deref().unwrap_or_default(),
            bytes = body.len(),
            "upstream response received"
        );

        Ok(RawResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// HTML results pages take location and paging as `loc`, `rcp` (page size)
/// and `rcs` (zero-based offset).
fn page_query_pairs(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let offset = u64::from(query.page.saturating_sub(1)) * u64::from(query.page_size);
    vec![
        ("loc", query.postal_code.clone()),
        ("rcp", query.page_size.to_string()),
        ("rcs", offset.to_string()),
    ]
}

fn transport_error(e: &reqwest::Error, url: &str) -> ScraperError {
    if e.is_timeout() {
        ScraperError::UpstreamTimeout {
            url: url.to_owned(),
        }
    } else {
        ScraperError::UpstreamUnavailable {
            url: url.to_owned(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
