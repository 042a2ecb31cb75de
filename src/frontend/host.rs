//! Frontend host server.
//!
//! Presents the browser with a single origin:
//! ```text
//! {api_prefix}, {api_prefix}/*  → reverse proxy to the backend
//! anything else                 → static file, or the index document (SPA)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{body::Body, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::StackConfig;
use crate::frontend::assets::resolve_static_dir;
use crate::frontend::proxy::{proxy_handler, ProxyError, ProxyState};
use crate::http::error::panic_response;
use crate::http::request::{access_log_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::recv_shutdown;

/// Static file server with an API reverse proxy.
pub struct FrontendHost {
    router: Router,
    config: StackConfig,
    static_dir: PathBuf,
}

impl FrontendHost {
    /// Create a host serving the static directory resolved for this process.
    pub fn new(config: StackConfig) -> Result<Self, ProxyError> {
        let static_dir = resolve_static_dir(&config.frontend, config.environment);
        Self::with_static_dir(config, static_dir)
    }

    /// Create a host serving `static_dir`.
    pub fn with_static_dir(config: StackConfig, static_dir: PathBuf) -> Result<Self, ProxyError> {
        let proxy = Arc::new(ProxyState::new(&config.frontend, &config.timeouts)?);

        let index = static_dir.join(&config.frontend.index_file);
        tracing::info!(
            static_dir = %static_dir.display(),
            environment = %config.environment,
            "Serving static assets"
        );
        if !index.is_file() {
            tracing::warn!(index = %index.display(), "Index document not found");
        }

        let router = Self::build_router(&config, &static_dir, &index, proxy);
        Ok(Self {
            router,
            config,
            static_dir,
        })
    }

    fn build_router(
        config: &StackConfig,
        static_dir: &Path,
        index: &Path,
        proxy: Arc<ProxyState>,
    ) -> Router {
        let prefix = config.frontend.api_prefix.as_str();
        let assets = ServeDir::new(static_dir).fallback(ServeFile::new(index));

        let stack = ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(set_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(access_log_span::<Body>)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(propagate_request_id_layer());

        Router::new()
            .route(prefix, any(proxy_handler))
            .route(&format!("{}/", prefix), any(proxy_handler))
            .route(&format!("{}/{{*rest}}", prefix), any(proxy_handler))
            .with_state(proxy)
            .fallback_service(assets)
            .layer(stack)
    }

    /// The fully layered router, for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
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
            backend = %self.config.frontend.backend_url,
            prefix = %self.config.frontend.api_prefix,
            "Frontend host listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("Frontend host stopped");
        Ok(())
    }
}
