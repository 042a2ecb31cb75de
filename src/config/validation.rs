//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics for the process that is
//! about to start. Every problem is reported, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{Process, StackConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate `config` for `process`.
pub fn validate_config(config: &StackConfig, process: Process) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    match process {
        Process::Api => validate_api(config, &mut errors),
        Process::Frontend => validate_frontend(config, &mut errors),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_api(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    check_bind_address("api.bind_address", &config.api.bind_address, errors);

    if config.database.uri.trim().is_empty() {
        errors.push(ValidationError::new(
            "database.uri",
            "is required (set MONGO_URI)",
        ));
    }
    if config.database.tls_marker.is_empty() {
        errors.push(ValidationError::new("database.tls_marker", "must not be empty"));
    }
    if config.api.body_limit_bytes == 0 {
        errors.push(ValidationError::new("api.body_limit_bytes", "must be greater than zero"));
    }
}

fn validate_frontend(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    let frontend = &config.frontend;
    check_bind_address("frontend.bind_address", &frontend.bind_address, errors);

    match Url::parse(&frontend.backend_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
            "frontend.backend_url",
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        )),
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::new("frontend.backend_url", "missing host"))
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            "frontend.backend_url",
            format!("invalid URL: {}", e),
        )),
    }

    if !frontend.api_prefix.starts_with('/') || frontend.api_prefix.len() < 2 {
        errors.push(ValidationError::new(
            "frontend.api_prefix",
            "must start with '/' and name a path segment",
        ));
    } else if frontend.api_prefix.ends_with('/') || frontend.api_prefix.contains(['{', '}', '*']) {
        errors.push(ValidationError::new(
            "frontend.api_prefix",
            "must not end with '/' or contain route wildcards",
        ));
    }

    if frontend.index_file.is_empty() {
        errors.push(ValidationError::new("frontend.index_file", "must not be empty"));
    }
    if config.timeouts.proxy_secs == 0 {
        errors.push(ValidationError::new("timeouts.proxy_secs", "must be greater than zero"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than zero"));
    }
}

fn check_bind_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a socket address", value),
        ));
    }
}
