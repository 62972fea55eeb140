//! Shared primitives for all Rust crates in Lockdesk.

#![forbid(unsafe_code)]

/// Access token primitives shared across entry points.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{ClientToken, TokenSource, configured_client_token, resolve_client_token};

/// Result type used across Lockdesk crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Remote API call failed; `status` is set when a response arrived.
    #[error("{}", upstream_message(*status, message))]
    Upstream {
        /// HTTP status of the remote response, absent on transport failure.
        status: Option<u16>,
        /// Response body or transport error text.
        message: String,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the remote HTTP status carried by an upstream error.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

fn upstream_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("upstream returned status {status}: {message}"),
        None => format!("upstream request failed: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn upstream_error_mentions_status_when_present() {
        let error = AppError::Upstream {
            status: Some(409),
            message: "version mismatch".to_owned(),
        };

        assert_eq!(error.upstream_status(), Some(409));
        assert_eq!(
            error.to_string(),
            "upstream returned status 409: version mismatch"
        );
    }

    #[test]
    fn upstream_transport_error_has_no_status() {
        let error = AppError::Upstream {
            status: None,
            message: "connection refused".to_owned(),
        };

        assert_eq!(error.upstream_status(), None);
        assert_eq!(
            error.to_string(),
            "upstream request failed: connection refused"
        );
    }
}
