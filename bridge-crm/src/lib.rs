//! bridge-crm library interface
//!
//! Exposes the router and services for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use bridge_common::api::DEFAULT_ADMIN_TOKEN_MARKER;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{ContactStore, RateLimiter};

/// Whether CRM operations can run
#[derive(Clone)]
pub enum CrmStatus {
    Ready(Arc<dyn ContactStore>),
    /// CRM settings are missing; holds the configuration error message
    Unconfigured(String),
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub crm: CrmStatus,
    /// Sync ledger
    pub db: SqlitePool,
    /// Limits `POST /sync` per client IP
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Substring an admin bearer token must contain
    pub admin_token_marker: String,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(crm: CrmStatus, db: SqlitePool, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            crm,
            db,
            rate_limiter,
            admin_token_marker: DEFAULT_ADMIN_TOKEN_MARKER.to_string(),
            startup_time: Utc::now(),
        }
    }

    pub fn with_admin_token_marker(mut self, marker: impl Into<String>) -> Self {
        self.admin_token_marker = marker.into();
        self
    }

    /// The contact store, or the configuration error as an API error
    pub fn store(&self) -> ApiResult<Arc<dyn ContactStore>> {
        match &self.crm {
            CrmStatus::Ready(store) => Ok(Arc::clone(store)),
            CrmStatus::Unconfigured(reason) => Err(ApiError::Configuration(reason.clone())),
        }
    }

    pub fn crm_configured(&self) -> bool {
        matches!(self.crm, CrmStatus::Ready(_))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::behavior_routes())
        .merge(api::sync_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
