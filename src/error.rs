//! OAI Error Types
//!
//! Error handling for the client, the HTTP layer and the event stream reader.

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Main error type for client operations
#[derive(Debug, Error)]
pub enum OaiError {
    /// Configuration errors (invalid JSON, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a non-2xx status
    #[error("API error: {0}")]
    Api(ApiError),

    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be read or decoded
    #[error("Response error: {0}")]
    Response(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A streamed event did not start with the `data: ` prefix
    #[error("Streaming error: event is missing the `data: ` prefix")]
    BadPrefix,

    /// Reading the streamed response body failed
    #[error("Streaming error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the stream
    #[error("Stream cancelled")]
    Cancelled,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OaiError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OaiError::Api(err) => err.is_retryable(),
            OaiError::Timeout(_) => true,
            OaiError::Request(msg) => msg.starts_with("Connection failed"),
            _ => false,
        }
    }

    /// The HTTP status, if the API answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            OaiError::Api(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Structured error returned by the API for non-2xx responses.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_type: Option<String>,
    pub param: Option<String>,
    pub code: Option<serde_json::Value>,
}

/// Wire shape: `{"error": {"message": ..., "type": ..., "param": ..., "code": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    param: Option<String>,
    code: Option<serde_json::Value>,
}

impl ApiError {
    /// Build an error from a status and the raw response body.
    ///
    /// Falls back to the raw text when the body is not the API's error envelope.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error: Some(err) }) => Self {
                status,
                message: err.message,
                error_type: err.error_type,
                param: err.param,
                code: err.code,
            },
            _ => Self {
                status,
                message: body.trim().to_string(),
                error_type: None,
                param: None,
                code: None,
            },
        }
    }

    /// Server errors and rate limiting are retryable.
    pub fn is_retryable(&self) -> bool {
        self.status.is_server_error() || self.status == StatusCode::TOO_MANY_REQUESTS
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status.as_u16())?;
        if let Some(kind) = &self.error_type {
            write!(f, " ({})", kind)?;
        }
        if self.message.is_empty() {
            Ok(())
        } else {
            write!(f, ": {}", self.message)
        }
    }
}

impl From<ApiError> for OaiError {
    fn from(err: ApiError) -> Self {
        OaiError::Api(err)
    }
}

impl From<reqwest::Error> for OaiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OaiError::Timeout(err.to_string())
        } else if err.is_connect() {
            OaiError::Request(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            OaiError::Response(format!("Failed to decode response: {}", err))
        } else {
            OaiError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OaiError {
    fn from(err: serde_json::Error) -> Self {
        OaiError::Response(format!("JSON parsing error: {}", err))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, OaiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_envelope() {
        let body = r#"{
            "error": {
                "message": "You exceeded your current quota",
                "type": "insufficient_quota",
                "param": null,
                "code": "insufficient_quota"
            }
        }"#;

        let err = ApiError::from_body(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(err.message, "You exceeded your current quota");
        assert_eq!(err.error_type.as_deref(), Some("insufficient_quota"));
        assert_eq!(err.code, Some(serde_json::json!("insufficient_quota")));
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "upstream unavailable\n");
        assert_eq!(err.message, "upstream unavailable");
        assert!(err.error_type.is_none());
        assert_eq!(err.to_string(), "HTTP 502: upstream unavailable");
    }

    #[test]
    fn test_retryable_classification() {
        let cases = [
            (StatusCode::BAD_REQUEST, false),
            (StatusCode::UNAUTHORIZED, false),
            (StatusCode::NOT_FOUND, false),
            (StatusCode::TOO_MANY_REQUESTS, true),
            (StatusCode::INTERNAL_SERVER_ERROR, true),
            (StatusCode::SERVICE_UNAVAILABLE, true),
        ];

        for (status, retryable) in cases {
            let err = OaiError::from(ApiError::from_body(status, ""));
            assert_eq!(err.is_retryable(), retryable, "status {}", status);
            assert_eq!(err.status(), Some(status));
        }

        assert!(!OaiError::BadPrefix.is_retryable());
        assert!(!OaiError::Cancelled.is_retryable());
        assert!(OaiError::Timeout("slow".into()).is_retryable());
    }
}
