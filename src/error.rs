//! # Errors
//!
//! Error type shared by the client implementations and the helper layer.
//!
//! Remote failures are carried through unchanged as [`SecretManagerError::Api`]
//! (Google error body) or [`SecretManagerError::Http`] (anything else). The
//! only error raised locally before a call is made is
//! [`SecretManagerError::AlreadyExists`], plus [`PathBuilderError`] for
//! malformed resource names.

use std::fmt;

use serde::Deserialize;

use crate::paths::PathBuilderError;

/// Result alias used across the crate
pub type Result<T, E = SecretManagerError> = std::result::Result<T, E>;

/// Error details returned by the Google API in the `error` field
///
/// API Reference: https://cloud.google.com/apis/design/errors
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// HTTP status code (e.g., 404, 403, 500)
    pub code: u16,
    /// Human-readable error message
    pub message: String,
    /// Canonical status string (e.g., "NOT_FOUND", "PERMISSION_DENIED")
    #[serde(default)]
    pub status: String,
}

impl ApiError {
    pub fn new(code: u16, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: status.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "NOT_FOUND", message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(409, "ALREADY_EXISTS", message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(400, "FAILED_PRECONDITION", message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(400, "INVALID_ARGUMENT", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (code: {}, status: {})",
            self.message, self.code, self.status
        )
    }
}

/// GCP API error response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, thiserror::Error)]
pub enum SecretManagerError {
    /// Creation was refused because the secret is already present
    #[error("failed to create secret as secret already exists: {secret}")]
    AlreadyExists { secret: String },

    /// The service answered with a Google error body
    #[error("GCP API error: {0}")]
    Api(ApiError),

    /// The service answered with a non-success status and no parseable error body
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid resource name: {0}")]
    Path(#[from] PathBuilderError),

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to (de)serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The payload checksum sent by the service does not match the data
    #[error("payload checksum mismatch for {name}: expected {expected}, computed {actual}")]
    Checksum {
        name: String,
        expected: i64,
        actual: i64,
    },
}

impl SecretManagerError {
    /// The remote error, if this failure came from the service
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status code of a remote failure
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.code),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api(e) => e.code == 404 || e.status == "NOT_FOUND",
            _ => self.status_code() == Some(404),
        }
    }
}

impl From<ApiError> for SecretManagerError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_body_parses() {
        let body = r#"{"error":{"code":404,"message":"Secret [projects/p/secrets/s] not found.","status":"NOT_FOUND"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.code, 404);
        assert_eq!(parsed.error.status, "NOT_FOUND");

        let err = SecretManagerError::from(parsed.error);
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_already_exists_message() {
        let err = SecretManagerError::AlreadyExists {
            secret: "db-password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to create secret as secret already exists: db-password"
        );
        assert!(err.api_error().is_none());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_http_error_not_found() {
        let err = SecretManagerError::Http {
            status: 404,
            body: "not here".to_string(),
        };
        assert!(err.is_not_found());
    }
}
