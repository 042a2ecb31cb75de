//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → connector.rs (ConnectionTarget: URI + transport detected from URI)
//!     → lifecycle.rs (lazy cache, single in-flight attempt)
//!     → mongo.rs (driver connect + ping)
//!     → handle inserted into request extensions for route groups
//! ```

pub mod connector;
pub mod lifecycle;
pub mod mongo;

pub use connector::{ConnectionError, ConnectionTarget, Connector, Transport};
pub use lifecycle::{ConnectionLifecycle, ConnectionState, ReadinessProbe};
pub use mongo::MongoConnector;
