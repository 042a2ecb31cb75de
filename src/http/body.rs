//! JSON and URL-encoded body parsing.
//!
//! Runs before routing. Bodies with a JSON or form content type are buffered
//! under the configured cap and parsed once; the result rides along as a
//! [`ParsedBody`] request extension and the raw bytes are put back as the
//! body so handlers can still use axum extractors.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::security::limits::{declared_length_exceeds, read_capped, BodyReadError};

/// Parsed request body attached to the request extensions.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            ParsedBody::Form(_) => None,
        }
    }

    /// First value for `key` in a form body.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match self {
            ParsedBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            ParsedBody::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        Some(BodyKind::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

/// Size cap shared by the parser and axum's default extractor limit.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub async fn parse_body_middleware(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(kind) = body_kind(request.headers()) else {
        return next.run(request).await;
    };

    if declared_length_exceeds(request.headers(), limit) {
        tracing::warn!(limit, path = %request.uri().path(), "Rejected oversized body");
        return ApiError::PayloadTooLarge.into_response();
    }

    let (parts, body) = request.into_parts();
    let bytes = match read_capped(body, limit).await {
        Ok(bytes) => bytes,
        Err(BodyReadError::TooLarge { .. }) => {
            tracing::warn!(limit, path = %parts.uri.path(), "Rejected oversized body");
            return ApiError::PayloadTooLarge.into_response();
        }
        Err(e) => return ApiError::InvalidBody(e.to_string()).into_response(),
    };

    // Empty bodies pass through unparsed, like a request without a body.
    let parsed = if bytes.is_empty() {
        None
    } else {
        match parse(kind, &bytes) {
            Ok(parsed) => Some(parsed),
            Err(e) => return e.into_response(),
        }
    };

    let mut request = Request::from_parts(parts, Body::from(bytes));
    if let Some(parsed) = parsed {
        request.extensions_mut().insert(parsed);
    }
    next.run(request).await
}

fn parse(kind: BodyKind, bytes: &[u8]) -> Result<ParsedBody, ApiError> {
    match kind {
        BodyKind::Json => {
            let value: Value = serde_json::from_slice(bytes)
                .map_err(|e| ApiError::InvalidBody(e.to_string()))?;
            // Only objects and arrays are accepted at the top level.
            if !(value.is_object() || value.is_array()) {
                return Err(ApiError::InvalidBody(
                    "top-level JSON value must be an object or array".into(),
                ));
            }
            Ok(ParsedBody::Json(value))
        }
        BodyKind::Form => Ok(ParsedBody::Form(
            url::form_urlencoded::parse(bytes).into_owned().collect(),
        )),
    }
}
