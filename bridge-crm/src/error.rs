//! Error types for bridge-crm
//!
//! Maps service failures to HTTP responses. Every body uses the common
//! `{success: false, error, details?}` envelope. Server-side failures are
//! logged in full and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bridge_common::api::{ApiResponse, FieldIssue};
use thiserror::Error;

use crate::services::{ClickUpError, StoreError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed validation (400), with per-field problems
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldIssue>,
    },

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or rejected admin credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Too many requests from one client (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// CRM is not configured (500)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// CRM request failed (500)
    #[error("CRM error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(details: Vec<FieldIssue>) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Configuration(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation { message, details } => {
                ApiResponse::<()>::with_details(message, details)
            }
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => ApiResponse::error(msg),
            ApiError::Unauthorized(msg) => ApiResponse::error(format!("Unauthorized: {}", msg)),
            ApiError::RateLimited => {
                ApiResponse::error("Too many requests. Please try again later.")
            }
            ApiError::Configuration(msg) => {
                tracing::error!(error = %msg, "CRM configuration error");
                ApiResponse::error("CRM integration is not configured")
            }
            ApiError::Upstream(msg) => {
                tracing::error!(error = %msg, "CRM request failed");
                ApiResponse::error("CRM request failed")
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ApiResponse::error("Internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Contact not found: {}", id)),
            // No request field can lower a score, so a refused update is a write conflict
            StoreError::InvalidUpdate(e) => ApiError::Internal(e.to_string()),
            StoreError::Mapping(e) => ApiError::Internal(e.to_string()),
            StoreError::Upstream(ClickUpError::Unauthorized) => {
                ApiError::Configuration(ClickUpError::Unauthorized.to_string())
            }
            StoreError::Upstream(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<bridge_common::Error> for ApiError {
    fn from(err: bridge_common::Error) -> Self {
        match err {
            bridge_common::Error::NotFound(msg) => ApiError::NotFound(format!("Not found: {}", msg)),
            bridge_common::Error::Config(msg) => ApiError::Configuration(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateRejected;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Configuration("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Upstream("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_mapping() {
        let not_found: ApiError = StoreError::NotFound("c9".into()).into();
        assert!(matches!(not_found, ApiError::NotFound(ref m) if m.contains("c9")));

        let rejected: ApiError = StoreError::InvalidUpdate(UpdateRejected::LeadScoreDecrease {
            current: 5,
            requested: 1,
        })
        .into();
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream: ApiError = StoreError::Upstream(ClickUpError::Timeout).into();
        assert!(matches!(upstream, ApiError::Upstream(_)));
    }

    #[test]
    fn test_config_error_maps_to_configuration() {
        let err: ApiError = bridge_common::Error::Config("CLICKUP_API_KEY not set".into()).into();
        assert!(matches!(err, ApiError::Configuration(_)));
    }
}
