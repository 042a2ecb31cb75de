//! Endpoints owned by the gateway itself, and the route-group mount contract.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::Environment;
use crate::db::lifecycle::ReadinessProbe;
use crate::http::error::ApiError;

/// State for the built-in endpoints.
#[derive(Clone)]
pub struct ApiState {
    pub started_at: Instant,
    pub environment: Environment,
    pub readiness_requires_database: bool,
    pub database: Arc<dyn ReadinessProbe>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: f64,
    pub environment: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub docs: &'static str,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /health: liveness. Never looks at the database.
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: timestamp(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.as_str(),
    })
}

/// GET /ready: readiness.
pub async fn ready(State(state): State<ApiState>) -> Response {
    if state.readiness_requires_database && !state.database.is_ready() {
        let body = ReadyResponse {
            status: "Not Ready",
            timestamp: timestamp(),
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    Json(ReadyResponse {
        status: "Ready",
        timestamp: timestamp(),
    })
    .into_response()
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Todo API is running!",
        version: env!("CARGO_PKG_VERSION"),
        docs: "/todos",
    })
}

/// Fallback for every unmatched method and path.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn not_implemented() -> ApiError {
    ApiError::NotImplemented
}

/// The four business route groups, each owning everything under its prefix.
///
/// Handlers reach the database through the connection handle the gateway
/// inserts into request extensions, e.g. `Extension<mongodb::Database>`.
pub struct RouteGroups {
    pub todos: Router,
    pub auth: Router,
    pub user: Router,
    pub nlp: Router,
}

impl RouteGroups {
    /// Every group answers 501 until replaced.
    pub fn new() -> Self {
        Self {
            todos: unimplemented_group(),
            auth: unimplemented_group(),
            user: unimplemented_group(),
            nlp: unimplemented_group(),
        }
    }

    pub fn todos(mut self, router: Router) -> Self {
        self.todos = router;
        self
    }

    pub fn auth(mut self, router: Router) -> Self {
        self.auth = router;
        self
    }

    pub fn user(mut self, router: Router) -> Self {
        self.user = router;
        self
    }

    pub fn nlp(mut self, router: Router) -> Self {
        self.nlp = router;
        self
    }

    /// Mount prefix and group, in dispatch order.
    pub fn into_mounts(self) -> [(&'static str, Router); 4] {
        [
            ("/todos", self.todos),
            ("/auth", self.auth),
            ("/user", self.user),
            ("/nlp", self.nlp),
        ]
    }
}

impl Default for RouteGroups {
    fn default() -> Self {
        Self::new()
    }
}

fn unimplemented_group() -> Router {
    Router::new().fallback(not_implemented)
}
