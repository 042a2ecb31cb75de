//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both
//! processes. All types derive Serde traits for deserialization from config
//! files; every field has a default so an empty file is a valid config.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the API gateway and the frontend host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StackConfig {
    /// Deployment mode (`NODE_ENV`).
    pub environment: Environment,

    /// API gateway settings.
    pub api: ApiConfig,

    /// Document database settings.
    pub database: DatabaseConfig,

    /// Frontend host (static files + `/api` proxy) settings.
    pub frontend: FrontendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which of the two processes a config is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Process {
    /// API gateway (`todo-stack api`).
    Api,
    /// Static file host and `/api` proxy (`todo-stack frontend`).
    Frontend,
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Parse a `NODE_ENV`-style value. Unknown values map to development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Maximum JSON / URL-encoded body size in bytes.
    pub body_limit_bytes: usize,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,

    /// When true, `/ready` reports 503 until the database is connected.
    pub readiness_requires_database: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            body_limit_bytes: 10 * 1024 * 1024, // 10MB
            cors_allowed_origins: Vec::new(),
            readiness_requires_database: false,
        }
    }
}

/// Document database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (`MONGO_URI`).
    pub uri: String,

    /// Literal substring of the URI that switches on TLS transport.
    pub tls_marker: String,

    /// CA bundle used when TLS transport is selected.
    pub tls_ca_file: PathBuf,

    /// Database used when the URI does not name one.
    pub default_database: String,

    /// Application name reported to the server.
    pub app_name: String,

    /// Server selection timeout in seconds.
    pub server_selection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            tls_marker: "ssl=true".to_string(),
            tls_ca_file: PathBuf::from("/etc/ssl/certs/rds-combined-ca-bundle.pem"),
            default_database: "todo".to_string(),
            app_name: "todo-stack".to_string(),
            server_selection_timeout_secs: 10,
        }
    }
}

/// Frontend host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,

    /// Origin of the API gateway that `/api` traffic is forwarded to.
    pub backend_url: String,

    /// Path prefix that is proxied.
    pub api_prefix: String,

    /// Remove `api_prefix` from the forwarded path.
    pub strip_api_prefix: bool,

    /// Explicit static asset directory. Resolved from the environment when unset.
    pub static_dir: Option<PathBuf>,

    /// Entry document served for every non-file path.
    pub index_file: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
            backend_url: "http://localhost:3001".to_string(),
            api_prefix: "/api".to_string(),
            strip_api_prefix: false,
            static_dir: None,
            index_file: "index.html".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Proxy round-trip timeout in seconds.
    pub proxy_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            proxy_secs: 30,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// `Strict-Transport-Security` max-age in seconds.
    pub hsts_max_age_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            hsts_max_age_secs: 15_552_000, // 180 days
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format. Defaults to JSON in production, pretty elsewhere.
    pub log_format: Option<LogFormat>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
