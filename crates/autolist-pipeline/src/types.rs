use std::fmt;

use autolist_core::AppConfig;
use autolist_scraper::{Channel, ExtractionError};
use serde::Serialize;

const DEFAULT_SOURCE_PREFIX: &str = "autotrader";

/// Explicit settings handed to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Scheme and host that relative listing URLs are completed against.
    pub site_origin: String,
    /// Prefix of the source id under which totals are recorded, e.g.
    /// `autotrader` gives `autotrader:N5X0E2`.
    pub source_prefix: String,
    pub page_size: u32,
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            site_origin: config.upstream_base_url.clone(),
            source_prefix: DEFAULT_SOURCE_PREFIX.to_string(),
            page_size: config.page_size,
        }
    }

    #[must_use]
    pub fn source_id(&self, postal_code: &str) -> String {
        format!("{}:{postal_code}", self.source_prefix)
    }
}

/// What to scrape in one call to [`crate::Orchestrator::scrape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeParams {
    pub postal_code: String,
    pub page: u32,
    pub channel: Channel,
    /// Site path for [`Channel::Page`]; ignored by the other channels.
    pub page_path: Option<String>,
}

/// Points at the input that failed: a fragment, or one record inside an HTML
/// fragment's embedded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FragmentRef {
    pub fragment: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<usize>,
}

impl FragmentRef {
    #[must_use]
    pub fn whole(fragment: usize) -> Self {
        Self {
            fragment,
            record: None,
        }
    }

    #[must_use]
    pub fn record(fragment: usize, record: usize) -> Self {
        Self {
            fragment,
            record: Some(record),
        }
    }
}

impl fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record {
            Some(record) => write!(f, "fragment {}, record {record}", self.fragment),
            None => write!(f, "fragment {}", self.fragment),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    MalformedPayload,
    Normalization,
    MissingIdentity,
}

impl From<&ExtractionError> for FailureKind {
    fn from(err: &ExtractionError) -> Self {
        match err {
            ExtractionError::NotFound => FailureKind::NotFound,
            ExtractionError::MalformedPayload { .. } => FailureKind::MalformedPayload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub fragment_ref: FragmentRef,
    pub error_kind: FailureKind,
    pub message: String,
}

/// Summary of one run. `failed` always equals `failures.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub inserted: usize,
    pub duplicate: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub(crate) fn push_failure(
        &mut self,
        fragment_ref: FragmentRef,
        error_kind: FailureKind,
        message: String,
    ) {
        self.failed += 1;
        self.failures.push(ItemFailure {
            fragment_ref,
            error_kind,
            message,
        });
    }
}
