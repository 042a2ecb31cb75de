//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{Environment, Process, StackConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {message}")]
    Env { name: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: Option<&Path>, process: Process) -> Result<StackConfig, ConfigError> {
    load_config_with(path, process, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(
    path: Option<&Path>,
    process: Process,
    lookup: F,
) -> Result<StackConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => StackConfig::default(),
    };

    apply_env_overrides(&mut config, process, lookup)?;
    validate_config(&config, process).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the environment variables the deployment platforms set.
pub fn apply_env_overrides<F>(
    config: &mut StackConfig,
    process: Process,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(env) = lookup("NODE_ENV") {
        config.environment = Environment::from_name(&env);
    }
    if let Some(uri) = lookup("MONGO_URI") {
        config.database.uri = uri;
    }
    if let Some(url) = lookup("BACKEND_URL").or_else(|| lookup("REACT_APP_BACKEND_URL")) {
        config.frontend.backend_url = url;
    }
    if let Some(dir) = lookup("STATIC_DIR") {
        config.frontend.static_dir = Some(PathBuf::from(dir));
    }

    let bind_address = match process {
        Process::Api => &mut config.api.bind_address,
        Process::Frontend => &mut config.frontend.bind_address,
    };
    if let Some(host) = lookup("HOST") {
        let (_, port) = split_host_port(bind_address.as_str());
        *bind_address = join_host_port(&host, port);
    }
    if let Some(port) = lookup("PORT") {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            name: "PORT",
            message: format!("'{}' is not a port number", port),
        })?;
        let (host, _) = split_host_port(bind_address.as_str());
        *bind_address = join_host_port(host, &port.to_string());
    }

    Ok(())
}

fn split_host_port(address: &str) -> (&str, &str) {
    match address.rsplit_once(':') {
        Some((host, port)) => (host, port),
        None => (address, ""),
    }
}

fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
