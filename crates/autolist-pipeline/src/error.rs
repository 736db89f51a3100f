use std::fmt;

use autolist_db::DbError;
use autolist_scraper::ScraperError;
use serde::Serialize;
use thiserror::Error;

/// Where in a run a whole-batch failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Persist,
    RecordCount,
    Health,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Persist => "persist",
            Stage::RecordCount => "record_count",
            Stage::Health => "health",
        };
        f.write_str(name)
    }
}

/// Failures that abort the whole run. Per-item problems never show up here;
/// they are counted in [`crate::BatchResult::failures`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("upstream fetch failed for {source_id}: {source}")]
    Upstream {
        source_id: String,
        #[source]
        source: ScraperError,
    },

    #[error("storage unavailable for {source_id} during {stage}: {source}")]
    StorageUnavailable {
        source_id: String,
        stage: Stage,
        #[source]
        source: DbError,
    },
}

impl PipelineError {
    /// True when the upstream request ran out of time, as opposed to failing
    /// outright.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipelineError::Upstream {
                source: ScraperError::UpstreamTimeout { .. },
                ..
            }
        )
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Upstream { .. } => Stage::Fetch,
            PipelineError::StorageUnavailable { stage, .. } => *stage,
        }
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        match self {
            PipelineError::Upstream { source_id, .. }
            | PipelineError::StorageUnavailable { source_id, .. } => source_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguished_from_other_upstream_failures() {
        let timeout = PipelineError::Upstream {
            source_id: "autotrader:N5X0E2".to_string(),
            source: ScraperError::UpstreamTimeout {
                url: "https://www.autotrader.ca/api/search".to_string(),
            },
        };
        let status = PipelineError::Upstream {
            source_id: "autotrader:N5X0E2".to_string(),
            source: ScraperError::UnexpectedStatus {
                status: 503,
                url: "https://www.autotrader.ca/api/search".to_string(),
            },
        };

        assert!(timeout.is_timeout());
        assert!(!status.is_timeout());
        assert_eq!(status.stage(), Stage::Fetch);
    }

    #[test]
    fn storage_error_message_names_source_and_stage() {
        let err = PipelineError::StorageUnavailable {
            source_id: "autotrader:N5X0E2".to_string(),
            stage: Stage::RecordCount,
            source: DbError::MissingIdentity,
        };

        let message = err.to_string();
        assert!(message.contains("autotrader:N5X0E2"), "{message}");
        assert!(message.contains("record_count"), "{message}");
        assert_eq!(err.source_id(), "autotrader:N5X0E2");
    }
}
