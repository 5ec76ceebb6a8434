//! Error types for mediafetch
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error variants (input validation, tool spawning, config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Note that a tool run that exits zero without producing a resolvable
//! download link is *not* an error: it is reported through the event stream
//! as a degraded success (`done` with `ok: true` and no `download_url`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for mediafetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediafetch
#[derive(Debug, Error)]
pub enum Error {
    /// Request input was rejected before any job was started
    /// (malformed URL, disallowed scheme)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// The external download tool could not be launched
    /// (binary missing, permission denied)
    #[error("failed to spawn download tool: {0}")]
    ToolSpawn(String),

    /// The external download tool ran but exited nonzero
    #[error("download tool exited with code {code}")]
    ToolFailure {
        /// Numeric exit code reported by the tool
        code: i32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Standard API error response format
///
/// This struct represents the JSON error response returned by the REST API.
/// It follows a standard format with machine-readable error codes and
/// human-readable messages.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_input",
///     "message": "invalid input: URL scheme must be http or https"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_input", "config_error")
    pub code: String,

    /// Human-readable error message suitable for displaying to end users
    pub message: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.error_code().to_string(), error.to_string())
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected before a job started
            Error::InvalidInput(_) => 400,

            // 500 Internal Server Error - server-side issues
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - the external tool misbehaved
            Error::ToolFailure { .. } => 502,

            // 503 Service Unavailable - the tool is not runnable at all
            Error::ToolSpawn(_) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::Config { .. } => "config_error",
            Error::ToolSpawn(_) => "tool_spawn_failed",
            Error::ToolFailure { .. } => "tool_failed",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let error = Error::InvalidInput("bad scheme".to_string());
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), "invalid_input");
    }

    #[test]
    fn spawn_failure_maps_to_503() {
        let error = Error::ToolSpawn("No such file or directory".to_string());
        assert_eq!(error.status_code(), 503);
        assert_eq!(error.error_code(), "tool_spawn_failed");
    }

    #[test]
    fn tool_failure_carries_exit_code() {
        let error = Error::ToolFailure { code: 1 };
        assert_eq!(error.status_code(), 502);
        assert_eq!(error.to_string(), "download tool exited with code 1");
    }

    #[test]
    fn config_error_includes_key() {
        let error = Error::config("PORT is not a number", "PORT");
        assert_eq!(error.status_code(), 500);
        match error {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("PORT")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn api_error_from_error_serializes_expected_shape() {
        let api_error: ApiError =
            Error::InvalidInput("URL scheme must be http or https".into()).into();
        let json = serde_json::to_value(&api_error).unwrap();
        assert_eq!(json["error"]["code"], "invalid_input");
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("http or https")
        );
    }
}
