//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::{AppState, CrmStatus};

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    /// "ok", or "degraded" when the CRM is not configured
    pub status: String,
    /// Module name ("bridge-crm")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub crm_configured: bool,
    /// Contact store backend ("clickup", "memory"), when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_backend: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, crm_backend) = match &state.crm {
        CrmStatus::Ready(store) => ("ok", Some(store.backend_name().to_string())),
        CrmStatus::Unconfigured(_) => ("degraded", None),
    };

    Json(HealthResponse {
        success: true,
        status: status.to_string(),
        module: "bridge-crm".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        crm_configured: state.crm_configured(),
        crm_backend,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
