//! Admin bearer-token checks
//!
//! Administrative endpoints accept `Authorization: Bearer <token>` where the
//! token contains a configured marker string (`admin-key` by default).
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies. Services pass in the raw header value.

use thiserror::Error;

/// Marker an admin bearer token must contain unless configured otherwise
pub const DEFAULT_ADMIN_TOKEN_MARKER: &str = "admin-key";

/// Admin authorization failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminAuthError {
    /// No Authorization header was sent
    #[error("Missing Authorization header")]
    MissingHeader,

    /// Header present but not of the form `Bearer <token>`
    #[error("Authorization header is not a bearer token")]
    NotBearer,

    /// Bearer token does not grant admin access
    #[error("Bearer token does not grant admin access")]
    Forbidden,
}

/// Extract the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively; surrounding whitespace is ignored.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let trimmed = header_value.trim();
    let (scheme, token) = trimmed.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Check an optional `Authorization` header for admin access
pub fn is_admin_token(header_value: Option<&str>, marker: &str) -> Result<(), AdminAuthError> {
    let header_value = header_value.ok_or(AdminAuthError::MissingHeader)?;
    let token = bearer_token(header_value).ok_or(AdminAuthError::NotBearer)?;

    if !marker.is_empty() && token.contains(marker) {
        Ok(())
    } else {
        Err(AdminAuthError::Forbidden)
    }
}
