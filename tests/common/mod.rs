//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use todo_stack::db::{ConnectionError, ConnectionTarget, Transport};
use todo_stack::{ApiServer, ConnectionLifecycle, Connector, FrontendHost, RouteGroups, Shutdown, StackConfig};

/// Connector that counts calls, fails the first `failures` of them and
/// sleeps `delay` per attempt.
#[derive(Clone)]
pub struct FakeConnector {
    pub calls: Arc<AtomicU32>,
    pub failures: u32,
    pub delay: Duration,
}

impl FakeConnector {
    pub fn new(failures: u32, delay: Duration) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
            delay,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Handle = String;

    async fn connect(&self, _target: &ConnectionTarget) -> Result<String, ConnectionError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if attempt <= self.failures {
            Err(ConnectionError::Unavailable("connection refused".into()))
        } else {
            Ok(format!("db-{}", attempt))
        }
    }
}

pub fn api_config() -> StackConfig {
    let mut config = StackConfig::default();
    config.database.uri = "mongodb://127.0.0.1:27017/todo".into();
    config
}

/// A running in-process server.
pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

pub async fn spawn_api(config: StackConfig, connector: FakeConnector, groups: RouteGroups) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let lifecycle = Arc::new(ConnectionLifecycle::new(
        connector,
        ConnectionTarget::new(config.database.uri.clone(), Transport::Plaintext),
    ));

    let server = ApiServer::new(config, lifecycle, groups);
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx));
    Running { addr, shutdown, handle }
}

pub async fn spawn_frontend(config: StackConfig, static_dir: PathBuf) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let host = FrontendHost::with_static_dir(config, static_dir).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(host.run(listener, rx));
    Running { addr, shutdown, handle }
}

/// Backend that describes every request it receives as JSON.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "host": header("host"),
            "authorization": header("authorization"),
            "x_custom": header("x-custom"),
            "content_type": header("content-type"),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Raw TCP backend that answers every request with `response`, byte for byte.
pub async fn start_fixed_backend(response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = Arc::new(response);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Raw TCP backend that accepts connections and never answers.
pub async fn start_hanging_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
