//! Reverse proxy for `/api` traffic.
//!
//! Requests under the API prefix are forwarded to the backend origin with
//! their method, headers and body intact. The body is streamed in both
//! directions; nothing is buffered. Only hop-by-hop headers are dropped and
//! `Host` is rewritten to the backend authority. Backends may be `http://` or
//! `https://`; TLS uses rustls with the webpki root store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::config::{FrontendConfig, TimeoutConfig};
use crate::http::response::strip_hop_by_hop;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;

/// Proxy failures as seen by the browser.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::Unreachable(_) => "Bad gateway",
            ProxyError::Timeout(_) => "Gateway timeout",
            ProxyError::InvalidTarget(_) => "Internal Server Error",
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Shared proxy state: the pooled client and the parsed backend origin.
pub struct ProxyState {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
    base_path: String,
    prefix: String,
    strip_prefix: bool,
    timeout: Duration,
}

impl ProxyState {
    pub fn new(config: &FrontendConfig, timeouts: &TimeoutConfig) -> Result<Self, ProxyError> {
        let backend = Url::parse(&config.backend_url)
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", config.backend_url, e)))?;
        let scheme = match backend.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => {
                return Err(ProxyError::InvalidTarget(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };
        let host = backend
            .host()
            .ok_or_else(|| ProxyError::InvalidTarget("backend URL has no host".into()))?;
        let authority = match backend.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;
        let host_header = HeaderValue::from_str(authority.as_str())
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;

        let mut http = HttpConnector::new();
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        http.enforce_http(false);
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            scheme,
            authority,
            host_header,
            base_path: backend.path().trim_end_matches('/').to_string(),
            prefix: config.api_prefix.clone(),
            strip_prefix: config.strip_api_prefix,
            timeout: Duration::from_secs(timeouts.proxy_secs),
        })
    }

    /// Absolute backend URI for an incoming request URI.
    pub fn upstream_uri(&self, uri: &Uri) -> Result<Uri, ProxyError> {
        let path_and_query =
            upstream_path_and_query(uri, &self.prefix, self.strip_prefix, &self.base_path);
        let path_and_query = PathAndQuery::from_str(&path_and_query)
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();
        let uri = self.upstream_uri(&parts.uri)?;

        strip_hop_by_hop(&mut parts.headers);
        parts.headers.insert(header::HOST, self.host_header.clone());

        let mut upstream = Request::new(body);
        *upstream.method_mut() = parts.method;
        *upstream.uri_mut() = uri;
        *upstream.headers_mut() = parts.headers;

        let response = match tokio::time::timeout(self.timeout, self.client.request(upstream)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProxyError::Unreachable(e.to_string())),
            Err(_) => return Err(ProxyError::Timeout(self.timeout)),
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Path and query to request from the backend.
///
/// With `strip` the prefix is removed (`/api/todos` becomes `/todos`, `/api`
/// becomes `/`); otherwise the path is forwarded unchanged. `base` is the
/// backend URL's own path, without a trailing slash.
pub fn upstream_path_and_query(uri: &Uri, prefix: &str, strip: bool, base: &str) -> String {
    let path = uri.path();
    let forwarded = if strip {
        match path.strip_prefix(prefix) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    } else {
        path
    };

    match uri.query() {
        Some(query) => format!("{}{}?{}", base, forwarded, query),
        None => format!("{}{}", base, forwarded),
    }
}

/// Forward one request to the backend and relay its response.
pub async fn proxy_handler(
    State(state): State<Arc<ProxyState>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Proxying request");

    match state.forward(request).await {
        Ok(response) => {
            metrics::record_proxy_request(&method, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Proxy request failed"
            );
            metrics::record_proxy_request(&method, e.status().as_u16(), start);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_prefix_kept_by_default() {
        assert_eq!(
            upstream_path_and_query(&uri("/api/todos?done=true"), "/api", false, ""),
            "/api/todos?done=true"
        );
    }

    #[test]
    fn test_prefix_stripped() {
        assert_eq!(upstream_path_and_query(&uri("/api/todos/7"), "/api", true, ""), "/todos/7");
        assert_eq!(upstream_path_and_query(&uri("/api"), "/api", true, ""), "/");
        assert_eq!(upstream_path_and_query(&uri("/api?x=1"), "/api", true, ""), "/?x=1");
    }

    #[test]
    fn test_backend_base_path_prepended() {
        assert_eq!(
            upstream_path_and_query(&uri("/api/todos"), "/api", true, "/v1"),
            "/v1/todos"
        );
    }

    fn proxy_state(backend_url: &str, strip: bool) -> Result<ProxyState, ProxyError> {
        let config = FrontendConfig {
            backend_url: backend_url.to_string(),
            strip_api_prefix: strip,
            ..FrontendConfig::default()
        };
        ProxyState::new(&config, &TimeoutConfig::default())
    }

    #[tokio::test]
    async fn test_upstream_uri() {
        let state = proxy_state("http://backend:3001/", false).unwrap();
        assert_eq!(state.host_header, "backend:3001");
        assert_eq!(
            state.upstream_uri(&uri("/api/todos?page=2")).unwrap(),
            "http://backend:3001/api/todos?page=2"
        );

        let state = proxy_state("http://[::1]:3001/base", true).unwrap();
        assert_eq!(state.upstream_uri(&uri("/api/x")).unwrap(), "http://[::1]:3001/base/x");
    }

    #[tokio::test]
    async fn test_https_backend() {
        let state = proxy_state("https://api.example.com/v1", true).unwrap();
        assert_eq!(state.scheme, Scheme::HTTPS);
        assert_eq!(state.host_header, "api.example.com");
        assert_eq!(
            state.upstream_uri(&uri("/api/todos?page=2")).unwrap(),
            "https://api.example.com/v1/todos?page=2"
        );

        let state = proxy_state("https://api.example.com:8443", false).unwrap();
        assert_eq!(state.host_header, "api.example.com:8443");
        assert_eq!(
            state.upstream_uri(&uri("/api/todos")).unwrap(),
            "https://api.example.com:8443/api/todos"
        );
    }

    #[tokio::test]
    async fn test_rejects_unsupported_backend() {
        assert!(matches!(
            proxy_state("ftp://backend", false),
            Err(ProxyError::InvalidTarget(_))
        ));
        assert!(matches!(proxy_state("not a url", false), Err(ProxyError::InvalidTarget(_))));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ProxyError::Unreachable("refused".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::Timeout(Duration::from_secs(1)).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ProxyError::InvalidTarget("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
