//! API error type and the terminal error formatter.
//!
//! Every error leaves the gateway as a JSON object with an `error` field.
//! Internal detail is logged, never sent.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::ConnectionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Database unreachable or misconfigured (500).
    #[error("database connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// Body over the configured cap (413).
    #[error("payload too large")]
    PayloadTooLarge,

    /// Body could not be read or parsed (400).
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// No route matched (404).
    #[error("route not found")]
    RouteNotFound,

    /// Request ran past the gateway deadline (408).
    #[error("request timed out")]
    Timeout,

    /// A route group was mounted without an implementation (501).
    #[error("not implemented")]
    NotImplemented,

    /// Collaborator-defined status and message.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Anything else (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Connection(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Status { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Connection(e) => {
                tracing::error!(error = %e, "Database connection failed");
                "Database connection failed".to_string()
            }
            Self::PayloadTooLarge => "Payload too large".to_string(),
            Self::InvalidBody(detail) => {
                tracing::debug!(detail = %detail, "Rejected request body");
                "Invalid request body".to_string()
            }
            Self::RouteNotFound => "Route not found".to_string(),
            Self::NotImplemented => "Not implemented".to_string(),
            Self::Timeout => "Request timeout".to_string(),
            Self::Status { message, .. } => message.clone(),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                "Internal Server Error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Turn a handler panic into the generic 500 body. Used with `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn connection_error_is_500_without_detail() {
        let err = ApiError::from(ConnectionError::Unavailable("10.0.0.5:27017 refused".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Database connection failed" }));
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::RouteNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Route not found" }));
    }

    #[tokio::test]
    async fn payload_too_large_is_413() {
        let response = ApiError::PayloadTooLarge.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn timeout_is_408_json() {
        let response = ApiError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_json(response).await, json!({ "error": "Request timeout" }));
    }

    #[tokio::test]
    async fn collaborator_status_passes_through() {
        let response = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid token".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid token" }));
    }

    #[tokio::test]
    async fn panic_payload_is_hidden() {
        let response = panic_response(Box::new("secret stack detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "Internal Server Error" }));
    }
}
