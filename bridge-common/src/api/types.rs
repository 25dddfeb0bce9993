//! Shared API request/response types
//!
//! Every JSON response carries a `success` flag. Successful responses put
//! their payload under `data`; failures carry a human-readable `error`
//! string and, for validation failures, field-level `details`.

use serde::Serialize;

// ========================================
// Response Envelope
// ========================================

/// Response envelope used by every Bridge endpoint
///
/// # Examples
///
/// ```
/// use bridge_common::api::types::ApiResponse;
///
/// let ok = ApiResponse::ok(42);
/// assert!(ok.success);
///
/// let err: ApiResponse<()> = ApiResponse::error("Contact not found");
/// assert!(!err.success);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Field-level validation problems
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldIssue>,
}

impl<T> ApiResponse<T> {
    /// Successful response wrapping `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: Vec::new(),
        }
    }

    /// Failed response with a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: Vec::new(),
        }
    }

    /// Failed response with field-level details
    pub fn with_details(message: impl Into<String>, details: Vec<FieldIssue>) -> Self {
        Self {
            details,
            ..Self::error(message)
        }
    }
}

/// One field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// JSON path of the offending field (e.g. `contacts[2].email`)
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ========================================
// Tests
// ========================================
