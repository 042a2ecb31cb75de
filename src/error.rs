//! Process-level startup and serving errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::frontend::ProxyError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid proxy target: {0}")]
    Proxy(#[from] ProxyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Lines to print on stderr before logging is up. Validation failures get
    /// one line per field.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            ServerError::Config(ConfigError::Validation(errors)) => {
                let mut lines = vec!["invalid configuration:".to_string()];
                lines.extend(errors.iter().map(|e| format!("  - {}", e)));
                lines
            }
            other => vec![other.to_string()],
        }
    }
}
