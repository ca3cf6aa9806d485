//! Domain-specific error types for agri-nourish

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the advisor service
#[derive(Error, Debug)]
pub enum AgriError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Payload too large: upload exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported media: {message}")]
    UnsupportedMedia { message: String },

    #[error("Advisor error: {message}")]
    Advisor { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AgriError {
    pub fn validation(message: impl Into<String>) -> Self {
        AgriError::Validation {
            message: message.into(),
        }
    }

    pub fn advisor(message: impl Into<String>) -> Self {
        AgriError::Advisor {
            message: message.into(),
        }
    }

    /// HTTP status the error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            AgriError::Validation { .. } => StatusCode::BAD_REQUEST,
            AgriError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AgriError::UnsupportedMedia { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AgriError::Advisor { .. } => StatusCode::BAD_GATEWAY,
            AgriError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AgriError::Config { .. }
            | AgriError::Serialization { .. }
            | AgriError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AgriError {
    fn from(err: anyhow::Error) -> Self {
        AgriError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AgriError {
    fn from(err: serde_json::Error) -> Self {
        AgriError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AgriError {
    fn from(err: reqwest::Error) -> Self {
        AgriError::Advisor {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<std::io::Error> for AgriError {
    fn from(err: std::io::Error) -> Self {
        AgriError::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for AgriError {
    fn from(err: toml::de::Error) -> Self {
        AgriError::Config {
            message: err.to_string(),
        }
    }
}

/// Convert AgriError into a JSON error response
impl IntoResponse for AgriError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            json!({"error": {"code": status.as_u16(), "message": self.to_string()}}).to_string(),
        )
            .into_response()
    }
}

/// Result type alias for agri-nourish operations
pub type Result<T> = std::result::Result<T, AgriError>;
