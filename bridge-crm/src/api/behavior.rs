//! Behavior tracking API handlers
//!
//! POST /behavior, GET /behavior?contactId=

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use bridge_common::api::{ApiResponse, FieldIssue};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{BehaviorEventRequest, BehaviorOutcome, BehaviorSummary};
use crate::services::{behavior_summary, process_behavior_event};
use crate::validators::validate_behavior_request;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorQuery {
    pub contact_id: Option<String>,
}

/// POST /behavior
///
/// Record one engagement event and return the new lead score.
pub async fn record_behavior(
    State(state): State<AppState>,
    body: Result<Json<BehaviorEventRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<BehaviorOutcome>>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let event = validate_behavior_request(request, Utc::now()).map_err(ApiError::validation)?;
    let store = state.store()?;

    let outcome = process_behavior_event(store.as_ref(), &event).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /behavior?contactId=
pub async fn get_behavior(
    State(state): State<AppState>,
    Query(query): Query<BehaviorQuery>,
) -> ApiResult<Json<ApiResponse<BehaviorSummary>>> {
    let contact_id = query
        .contact_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation(vec![FieldIssue::new("contactId", "is required")]))?;

    let store = state.store()?;
    let summary = behavior_summary(store.as_ref(), &contact_id).await?;

    tracing::debug!(contact_id = %contact_id, lead_score = summary.lead_score, "Behavior summary");
    Ok(Json(ApiResponse::ok(summary)))
}

/// Build behavior routes
pub fn behavior_routes() -> Router<AppState> {
    Router::new().route("/behavior", get(get_behavior).post(record_behavior))
}
