//! Shared helpers for bridge-crm router tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

use bridge_crm::config::RateLimitConfig;
use bridge_crm::models::Contact;
use bridge_crm::services::{FixedWindowRateLimiter, InMemoryContactStore};
use bridge_crm::{AppState, CrmStatus};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryContactStore>,
    pub db: sqlx::SqlitePool,
}

/// Router over an in-memory store seeded with `contacts` and an in-memory ledger
pub async fn create_test_app(contacts: Vec<Contact>) -> TestApp {
    create_test_app_with_limit(contacts, RateLimitConfig::default()).await
}

pub async fn create_test_app_with_limit(contacts: Vec<Contact>, limit: RateLimitConfig) -> TestApp {
    let db = bridge_crm::db::init_in_memory_pool()
        .await
        .expect("Failed to create in-memory database");
    let store = Arc::new(InMemoryContactStore::with_contacts(contacts));

    let state = AppState::new(
        CrmStatus::Ready(store.clone()),
        db.clone(),
        Arc::new(FixedWindowRateLimiter::new(limit)),
    );

    TestApp {
        router: bridge_crm::build_router(state),
        store,
        db,
    }
}

/// Router whose CRM is not configured
pub async fn create_unconfigured_app() -> Router {
    let db = bridge_crm::db::init_in_memory_pool()
        .await
        .expect("Failed to create in-memory database");
    let state = AppState::new(
        CrmStatus::Unconfigured("ClickUp CRM is not configured: CLICKUP_API_KEY not set".into()),
        db,
        Arc::new(FixedWindowRateLimiter::new(RateLimitConfig::default())),
    );
    bridge_crm::build_router(state)
}

pub fn contact(id: &str, email: &str) -> Contact {
    Contact::new(id, "Ada", "Lovelace", email)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
