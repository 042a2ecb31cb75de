//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: MONGO_URI, PORT, BACKEND_URL, ...)
//!     → validation.rs (semantic checks for the starting process)
//!     → StackConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::{
    ApiConfig, DatabaseConfig, Environment, FrontendConfig, LogFormat, ObservabilityConfig,
    Process, SecurityConfig, StackConfig, TimeoutConfig,
};
pub use validation::ValidationError;
