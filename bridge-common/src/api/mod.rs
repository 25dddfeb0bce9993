//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with framework-specific extractors (Axum, etc.).

pub mod auth;
pub mod types;

pub use auth::{bearer_token, is_admin_token, AdminAuthError, DEFAULT_ADMIN_TOKEN_MARKER};
pub use types::{ApiResponse, FieldIssue};
