use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the Anthropic Messages API.
///
/// The `Display` text is what the caller sees in the `error` field.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("empty response")]
    EmptyResponse,

    #[error("parse failure")]
    ParseFailure(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    BadBody(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RelayError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::BadBody(_) | RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::BadBody(e.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("❌ Error: {}", self);
        } else {
            log::warn!("⚠️ Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_format() {
        let err = UpstreamError::Status {
            status: 401,
            message: "invalid x-api-key".to_string(),
        };
        assert_eq!(err.to_string(), "401: invalid x-api-key");
    }

    #[test]
    fn test_parse_failure_hides_detail() {
        let err = UpstreamError::ParseFailure("expected value at line 1 column 1".to_string());
        assert_eq!(err.to_string(), "parse failure");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            RelayError::from(UpstreamError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(RelayError::from(UpstreamError::EmptyResponse).to_string(), "empty response");
    }
}
