use std::str::FromStr;

use autolist_pipeline::{BatchResult, PipelineError, ScrapeParams};
use autolist_scraper::Channel;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScrapeData {
    source_id: String,
    page: u32,
    channel: Channel,
    batch: BatchResult,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    pub postal_code: Option<String>,
    pub page: Option<u32>,
    pub channel: Option<String>,
    pub path: Option<String>,
}

/// Runs one scrape synchronously and reports the batch summary.
///
/// The whole run is bounded by `AppState::scrape_deadline`; hitting it, or an
/// upstream timeout, answers 504. Any other whole-batch failure answers 500.
pub(super) async fn scrape_autotrader(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ApiResponse<ScrapeData>>, ApiError> {
    let channel = match query.channel.as_deref().map(str::trim) {
        None | Some("") => Channel::default(),
        Some(raw) => Channel::from_str(raw)
            .map_err(|reason| ApiError::new(req_id.0.clone(), "validation_error", reason))?,
    };
    let postal_code = query
        .postal_code
        .map(|p| p.trim().to_uppercase().replace(' ', ""))
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.default_postal_code.clone());
    let page = query.page.unwrap_or(1).max(1);

    let params = ScrapeParams {
        postal_code,
        page,
        channel,
        page_path: query.path,
    };
    let source_id = state.orchestrator.config().source_id(&params.postal_code);

    let outcome =
        tokio::time::timeout(state.scrape_deadline, state.orchestrator.scrape(&params)).await;
    let batch = match outcome {
        Ok(Ok(batch)) => batch,
        Ok(Err(e)) => return Err(map_pipeline_error(req_id.0, &e)),
        Err(_) => {
            tracing::warn!(
                source_id = %source_id,
                deadline_secs = state.scrape_deadline.as_secs(),
                "scrape exceeded deadline"
            );
            return Err(ApiError::new(
                req_id.0,
                "upstream_timeout",
                format!("scrape for {source_id} exceeded its deadline"),
            ));
        }
    };

    Ok(Json(ApiResponse {
        data: ScrapeData {
            source_id,
            page,
            channel,
            batch,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    tracing::error!(
        source_id = error.source_id(),
        stage = %error.stage(),
        error = %error,
        "scrape failed"
    );
    if error.is_timeout() {
        ApiError::new(
            request_id,
            "upstream_timeout",
            format!("upstream timed out for {}", error.source_id()),
        )
    } else {
        ApiError::new(
            request_id,
            "internal_error",
            format!(
                "scrape failed during {} for {}",
                error.stage(),
                error.source_id()
            ),
        )
    }
}
