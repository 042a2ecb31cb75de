//! Per-request deadline with a JSON 408.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;

/// Longest a request may spend inside the gateway, database connect included.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

pub async fn request_timeout_middleware(
    State(RequestTimeout(limit)): State<RequestTimeout>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                method = %method,
                path = %path,
                timeout_secs = limit.as_secs_f64(),
                "Request timed out"
            );
            ApiError::Timeout.into_response()
        }
    }
}
