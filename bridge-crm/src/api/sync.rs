//! Contact sync API handlers
//!
//! - POST /sync - sync or import a batch (rate limited per client IP)
//! - GET /sync - CRM analytics, last run, whether sync is available
//! - GET /sync?action=init-fields - custom field diagnostic (admin only)
//! - GET /sync/failures?runId= - failed items of a recorded run

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::get,
    Json, Router,
};
use bridge_common::api::{is_admin_token, ApiResponse, FieldIssue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::client_ip::ClientIp;
use crate::db::{self, SyncRunSummary};
use crate::error::{ApiError, ApiResult};
use crate::models::{SyncFailure, SyncReport, SyncRequest};
use crate::services::{get_crm_analytics, run_sync, CrmAnalytics};
use crate::validators::validate_sync_request;
use crate::{AppState, CrmStatus};

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailuresQuery {
    pub run_id: Option<String>,
}

/// GET /sync response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    /// `None` when the CRM is not configured
    pub analytics: Option<CrmAnalytics>,
    pub last_sync: Option<SyncRunSummary>,
    pub sync_enabled: bool,
}

/// GET /sync/failures response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailuresResponse {
    pub run_id: Uuid,
    pub failures: Vec<SyncFailure>,
}

/// POST /sync
pub async fn post_sync(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SyncReport>>> {
    if !state.rate_limiter.check_and_consume(&client_ip) {
        tracing::warn!(client_ip = %client_ip, "Sync rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (mode, contacts) = validate_sync_request(request).map_err(ApiError::validation)?;
    let store = state.store()?;

    let report = run_sync(store.as_ref(), mode, contacts).await;

    // The batch has already been applied; a ledger failure must not hide the report
    if let Err(e) = db::record_sync_run(&state.db, &report).await {
        tracing::error!(run_id = %report.run_id, error = %e, "Failed to record sync run");
    }

    Ok(Json(ApiResponse::ok(report)))
}

/// GET /sync and GET /sync?action=init-fields
pub async fn get_sync(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<Value>>> {
    match query.action.as_deref() {
        None => {
            let status = sync_status(&state).await?;
            Ok(Json(ApiResponse::ok(to_json(status)?)))
        }
        Some("init-fields") => {
            let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            is_admin_token(authorization, &state.admin_token_marker)
                .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

            let store = state.store()?;
            let report = store.field_report().await?;
            tracing::info!(
                backend = %report.backend,
                mapped = report.mapped.len(),
                unmapped = report.unmapped.len(),
                "Field diagnostic requested"
            );
            Ok(Json(ApiResponse::ok(to_json(report)?)))
        }
        Some(other) => Err(ApiError::validation(vec![FieldIssue::new(
            "action",
            format!("unknown action '{}'", other),
        )])),
    }
}

async fn sync_status(state: &AppState) -> ApiResult<SyncStatusResponse> {
    let last_sync = db::last_sync(&state.db).await?;

    let analytics = match &state.crm {
        CrmStatus::Ready(store) => Some(get_crm_analytics(store.as_ref()).await?),
        CrmStatus::Unconfigured(_) => None,
    };

    Ok(SyncStatusResponse {
        analytics,
        last_sync,
        sync_enabled: state.crm_configured(),
    })
}

/// GET /sync/failures?runId=
pub async fn get_sync_failures(
    State(state): State<AppState>,
    Query(query): Query<FailuresQuery>,
) -> ApiResult<Json<ApiResponse<SyncFailuresResponse>>> {
    let raw = query
        .run_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation(vec![FieldIssue::new("runId", "is required")]))?;
    let run_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::validation(vec![FieldIssue::new("runId", "must be a UUID")]))?;

    let failures = db::failures_for_run(&state.db, run_id).await?;
    Ok(Json(ApiResponse::ok(SyncFailuresResponse { run_id, failures })))
}

fn to_json<T: Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", get(get_sync).post(post_sync))
        .route("/sync/failures", get(get_sync_failures))
}
