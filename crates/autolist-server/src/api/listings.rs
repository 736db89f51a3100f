use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ListingItem {
    identity_url: String,
    source_id: String,
    title: Option<String>,
    price_display: Option<String>,
    city: Option<String>,
    mileage_km: Option<i64>,
    image_url: Option<String>,
    year: Option<i32>,
    make: Option<String>,
    model: Option<String>,
    first_seen_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ApiResponse<Vec<ListingItem>>>, ApiError> {
    let rows = autolist_db::list_listings(
        state.orchestrator.store().pool(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ListingItem {
            identity_url: row.identity_url,
            source_id: row.source_id,
            title: row.title,
            price_display: row.price_display,
            city: row.city,
            mileage_km: row.mileage_km,
            image_url: row.image_url,
            year: row.year,
            make: row.make,
            model: row.model,
            first_seen_at: row.first_seen_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
