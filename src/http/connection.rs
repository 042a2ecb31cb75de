//! Connection-ensure middleware for the business route groups.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::{ConnectionLifecycle, Connector};
use crate::http::error::ApiError;

/// Make sure a database handle exists before the route group runs.
///
/// On success the handle is inserted into the request extensions. On failure
/// the request ends here with a 500 and the next request tries again.
pub async fn ensure_connection<C: Connector>(
    State(lifecycle): State<Arc<ConnectionLifecycle<C>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match lifecycle.ensure().await {
        Ok(handle) => {
            request.extensions_mut().insert(handle);
            next.run(request).await
        }
        Err(e) => {
            tracing::error!(path = %request.uri().path(), "Connection check failed, short-circuiting request");
            ApiError::Connection(e).into_response()
        }
    }
}
