//! Request body limits.
//!
//! Bodies are buffered through a length limit so an oversized request is
//! rejected with 413 before any handler runs. A declared `Content-Length`
//! over the cap is rejected without reading the body at all.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyReadError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read body: {0}")]
    Read(String),
}

/// True when the declared `Content-Length` is already over `limit`.
pub fn declared_length_exceeds(headers: &HeaderMap, limit: usize) -> bool {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > limit as u64)
}

/// Buffer `body`, failing once more than `limit` bytes arrive.
pub async fn read_capped(body: Body, limit: usize) -> Result<Bytes, BodyReadError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(BodyReadError::TooLarge { limit }),
        Err(e) => Err(BodyReadError::Read(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_within_limit() {
        let bytes = read_capped(Body::from("hello"), 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_over_limit() {
        let err = read_capped(Body::from(vec![0u8; 11]), 10).await.unwrap_err();
        assert!(matches!(err, BodyReadError::TooLarge { limit: 10 }));
    }

    #[test]
    fn test_declared_length() {
        let mut headers = HeaderMap::new();
        assert!(!declared_length_exceeds(&headers, 10));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(!declared_length_exceeds(&headers, 10));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert!(declared_length_exceeds(&headers, 10));
    }
}
