//! Error types for the livepad server

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for server operations
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Errors that stop the server from starting or running
#[derive(Error, Debug)]
pub enum ServerError {
    /// Environment variables could not be deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),

    /// `HOST` is not an IP address
    #[error("Invalid bind host: {0}")]
    InvalidHost(String),

    /// The listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An error answered to an HTTP client
///
/// Rendered as `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: &'static str,
    /// Human-readable error message
    pub message: String,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(status: StatusCode, error_type: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            message,
        )
    }

    /// Create a 426 Upgrade Required error
    pub fn upgrade_required(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UPGRADE_REQUIRED, "upgrade_required", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Create a 503 Service Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
    }

    /// Render the JSON error response
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let body = ErrorResponse {
            error: ErrorBody {
                error_type: self.error_type,
                message: &self.message,
            },
        };
        // Serializing two strings cannot fail
        let json = serde_json::to_vec(&body).unwrap_or_default();

        let mut response = Response::new(Full::new(Bytes::from(json)));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<livepad_ws::WebSocketError> for HttpError {
    fn from(err: livepad_ws::WebSocketError) -> Self {
        if err.is_client_error() {
            HttpError::bad_request(err.to_string())
        } else {
            HttpError::internal(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "type")]
    error_type: &'a str,
    message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_response_body() {
        let response = HttpError::not_found("No such file: /missing.css").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "error": {"type": "not_found", "message": "No such file: /missing.css"}
            })
        );
    }

    #[test]
    fn test_upgrade_errors_map_to_bad_request() {
        let err = HttpError::from(livepad_ws::WebSocketError::invalid_upgrade("Missing key"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
