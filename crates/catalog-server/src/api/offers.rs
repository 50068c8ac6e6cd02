//! Offer history and trend handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use catalog_core::{PagedHistory, TimeWindow};
use catalog_db::OfferTrend;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_history_error, map_rejection, parse_uuid, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct WindowQuery {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn parse_i64(req_id: &str, raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        ApiError::new(
            req_id,
            "bad_request",
            format!("{what} must be an integer, got '{raw}'"),
        )
    })
}

/// GET /offer/{id}/history/{limit}/{offset} — one page of chronological
/// snapshots, optionally bounded by `start_time` / `end_time`.
pub(super) async fn get_offer_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, limit, offset)): Path<(String, String, String)>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PagedHistory>>, ApiError> {
    let rid = &req_id.0;
    let offer_id = parse_uuid(rid, &id, "offer id")?;
    let Query(query) = query.map_err(|e| map_rejection(rid, &e))?;
    let limit = parse_i64(rid, &limit, "limit")?;
    let offset = parse_i64(rid, &offset, "offset")?;
    let window = TimeWindow::new(query.start_time, query.end_time);

    let page = catalog_db::get_offer_history(&state.pool, offer_id, window, offset, limit)
        .await
        .map_err(|e| map_history_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, page)))
}

/// GET /offer/{id}/trend — percentage price change between the first and
/// last snapshot. The window ends now unless `end_time` is given.
pub(super) async fn get_offer_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<OfferTrend>>, ApiError> {
    let rid = &req_id.0;
    let offer_id = parse_uuid(rid, &id, "offer id")?;
    let Query(query) = query.map_err(|e| map_rejection(rid, &e))?;
    let window = TimeWindow::new(query.start_time, Some(query.end_time.unwrap_or_else(Utc::now)));

    let trend = catalog_db::get_offer_trend(&state.pool, offer_id, window)
        .await
        .map_err(|e| map_history_error(rid.clone(), &e))?;

    tracing::debug!(offer_id = %offer_id, trend = %trend.trend, "offer trend computed");

    Ok(Json(ApiResponse::new(req_id.0, trend)))
}
