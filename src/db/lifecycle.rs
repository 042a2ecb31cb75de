//! Lazy, request-triggered connection lifecycle.
//!
//! # States
//! ```text
//! Uninitialized ──(first successful ensure)──▶ Connected
//!       ▲   │
//!       └───┘ failed attempt: nothing cached, next ensure retries
//! ```
//!
//! There is no path back from `Connected`; the handle lives as long as the
//! process. Concurrent callers that arrive while an attempt is in flight wait
//! for that attempt instead of starting their own.

use std::time::Instant;

use tokio::sync::OnceCell;

use crate::db::connector::{ConnectionError, ConnectionTarget, Connector};
use crate::observability::metrics;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connected,
}

/// Object-safe view of connection readiness, for code that does not care
/// which connector is in use.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self) -> bool;
}

/// Owns the connector and the cached handle.
pub struct ConnectionLifecycle<C: Connector> {
    connector: C,
    target: ConnectionTarget,
    handle: OnceCell<C::Handle>,
}

impl<C: Connector> ConnectionLifecycle<C> {
    pub fn new(connector: C, target: ConnectionTarget) -> Self {
        Self {
            connector,
            target,
            handle: OnceCell::new(),
        }
    }

    /// Return the cached handle, connecting first if there is none.
    ///
    /// A cache hit performs no I/O. A failed attempt is returned to the caller
    /// and leaves the lifecycle `Uninitialized`.
    pub async fn ensure(&self) -> Result<C::Handle, ConnectionError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        let handle = self
            .handle
            .get_or_try_init(|| self.establish())
            .await?;
        Ok(handle.clone())
    }

    async fn establish(&self) -> Result<C::Handle, ConnectionError> {
        let start = Instant::now();
        if self.target.transport.is_tls() {
            tracing::info!(transport = %self.target.transport, "TLS connection detected, applying CA bundle");
        } else {
            tracing::info!(transport = %self.target.transport, "Standard connection detected (no TLS)");
        }

        match self.connector.connect(&self.target).await {
            Ok(handle) => {
                tracing::info!(
                    uri = %self.target.redacted_uri(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Connected to database"
                );
                metrics::record_db_connect("success");
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(
                    uri = %self.target.redacted_uri(),
                    error = %e,
                    "Failed to connect to database"
                );
                metrics::record_db_connect("failure");
                Err(e)
            }
        }
    }

    /// True once a handle is cached.
    pub fn is_ready(&self) -> bool {
        self.handle.initialized()
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_ready() {
            ConnectionState::Connected
        } else {
            ConnectionState::Uninitialized
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }
}

impl<C: Connector> ReadinessProbe for ConnectionLifecycle<C> {
    fn is_ready(&self) -> bool {
        ConnectionLifecycle::is_ready(self)
    }
}
