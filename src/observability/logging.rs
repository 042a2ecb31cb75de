//! Structured logging.
//!
//! JSON output in production, pretty output elsewhere. `RUST_LOG` wins over
//! the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Resolve the effective format for `environment`.
pub fn log_format(config: &ObservabilityConfig, environment: Environment) -> LogFormat {
    config.log_format.unwrap_or(if environment.is_production() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })
}

/// Default filter directive when `RUST_LOG` is not set.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    format!("todo_stack={level},tower_http={level}", level = config.log_level)
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig, environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config).into());

    let registry = tracing_subscriber::registry().with(filter);
    match log_format(config, environment) {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_environment() {
        let config = ObservabilityConfig::default();
        assert_eq!(log_format(&config, Environment::Production), LogFormat::Json);
        assert_eq!(log_format(&config, Environment::Development), LogFormat::Pretty);

        let config = ObservabilityConfig {
            log_format: Some(LogFormat::Pretty),
            ..ObservabilityConfig::default()
        };
        assert_eq!(log_format(&config, Environment::Production), LogFormat::Pretty);
    }

    #[test]
    fn test_default_directive() {
        let config = ObservabilityConfig {
            log_level: "debug".into(),
            ..ObservabilityConfig::default()
        };
        assert_eq!(default_directive(&config), "todo_stack=debug,tower_http=debug");
    }
}
