//! Security response headers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

/// The fixed set of hardening headers applied to every API response.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        if !config.enable_headers {
            return Self::default();
        }

        let mut headers = vec![
            ("content-security-policy", HeaderValue::from_static(CONTENT_SECURITY_POLICY)),
            ("cross-origin-opener-policy", HeaderValue::from_static("same-origin")),
            ("cross-origin-resource-policy", HeaderValue::from_static("same-origin")),
            ("origin-agent-cluster", HeaderValue::from_static("?1")),
            ("referrer-policy", HeaderValue::from_static("no-referrer")),
            ("x-content-type-options", HeaderValue::from_static("nosniff")),
            ("x-dns-prefetch-control", HeaderValue::from_static("off")),
            ("x-download-options", HeaderValue::from_static("noopen")),
            ("x-frame-options", HeaderValue::from_static("SAMEORIGIN")),
            ("x-permitted-cross-domain-policies", HeaderValue::from_static("none")),
            ("x-xss-protection", HeaderValue::from_static("0")),
        ];

        let hsts = format!("max-age={}; includeSubDomains", config.hsts_max_age_secs);
        if let Ok(value) = HeaderValue::from_str(&hsts) {
            headers.push(("strict-transport-security", value));
        }

        Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (HeaderName::from_static(name), value))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Insert every header the response does not already carry.
    pub fn apply(&self, response: &mut Response) {
        let target = response.headers_mut();
        for (name, value) in &self.headers {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

pub async fn security_headers_middleware(
    State(headers): State<Arc<SecurityHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}
