//! API gateway server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the built-in endpoints and route groups
//! - Wire up middleware in a fixed order
//! - Ensure a database connection in front of the route groups
//! - Bind to a listener and serve until shutdown
//!
//! # Middleware Order (outermost first)
//! ```text
//! security headers → catch-panic → CORS → compression
//!     → request id + access log → timeout (JSON 408) → body parsing (10MB cap)
//!     → router ─┬─ /health, /ready, /           (no database)
//!               ├─ /todos /auth /user /nlp      (ensure connection first)
//!               └─ fallback 404 (unmatched path or method)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::{ApiConfig, StackConfig};
use crate::db::{ConnectionLifecycle, ConnectionTarget, Connector, MongoConnector};
use crate::http::body::{parse_body_middleware, BodyLimit};
use crate::http::connection::ensure_connection;
use crate::http::error::panic_response;
use crate::http::request::{access_log_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::routes::{self, ApiState, RouteGroups};
use crate::http::timeout::{request_timeout_middleware, RequestTimeout};
use crate::lifecycle::shutdown::recv_shutdown;
use crate::security::{security_headers_middleware, SecurityHeaders};

/// Build the production lifecycle from config.
pub fn mongo_lifecycle(config: &StackConfig) -> Arc<ConnectionLifecycle<MongoConnector>> {
    Arc::new(ConnectionLifecycle::new(
        MongoConnector::new(&config.database),
        ConnectionTarget::from_config(&config.database),
    ))
}

/// HTTP server for the API gateway.
pub struct ApiServer {
    router: Router,
    config: StackConfig,
}

impl ApiServer {
    /// Create a new API server. `lifecycle` is the only path to the database.
    pub fn new<C: Connector>(
        config: StackConfig,
        lifecycle: Arc<ConnectionLifecycle<C>>,
        groups: RouteGroups,
    ) -> Self {
        let state = ApiState {
            started_at: Instant::now(),
            environment: config.environment,
            readiness_requires_database: config.api.readiness_requires_database,
            database: lifecycle.clone(),
        };

        let router = Self::build_router(&config, state, lifecycle, groups);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers are added innermost first.
    fn build_router<C: Connector>(
        config: &StackConfig,
        state: ApiState,
        lifecycle: Arc<ConnectionLifecycle<C>>,
        groups: RouteGroups,
    ) -> Router {
        let ensure = middleware::from_fn_with_state(lifecycle, ensure_connection::<C>);

        let mut router = Router::new()
            .route("/health", get(routes::health))
            .route("/ready", get(routes::ready))
            .route("/", get(routes::root))
            .with_state(state);

        for (prefix, group) in groups.into_mounts() {
            // Unimplemented groups answer 501 from their fallback and never
            // need the database.
            let group = if group.has_routes() {
                group.route_layer(ensure.clone())
            } else {
                group
            };
            router = router.nest(prefix, group);
        }

        let limit = config.api.body_limit_bytes;
        let deadline = RequestTimeout(Duration::from_secs(config.timeouts.request_secs));
        let headers = Arc::new(SecurityHeaders::from_config(&config.security));

        router
            .fallback(routes::not_found)
            .method_not_allowed_fallback(routes::not_found)
            .layer(DefaultBodyLimit::max(limit))
            .layer(middleware::from_fn_with_state(BodyLimit(limit), parse_body_middleware))
            .layer(middleware::from_fn_with_state(deadline, request_timeout_middleware))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(access_log_span::<Body>)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(set_request_id_layer())
            .layer(CompressionLayer::new())
            .layer(cors_layer(&config.api))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(headers, security_headers_middleware))
    }

    /// The fully layered router, for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "API gateway listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("API gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any)
}
