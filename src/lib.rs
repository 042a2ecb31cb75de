//! Todo application server stack.
//!
//! Two processes share this crate:
//! - `api`: the API gateway. Built-in health endpoints plus four route
//!   groups that reach the document database through a lazily established,
//!   cached connection.
//! - `frontend`: serves the built single-page app and forwards `/api`
//!   traffic to the gateway.

pub mod config;
pub mod db;
pub mod error;
pub mod frontend;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::{Process, StackConfig};
pub use db::{ConnectionLifecycle, ConnectionState, Connector, MongoConnector};
pub use error::ServerError;
pub use frontend::FrontendHost;
pub use http::{ApiServer, RouteGroups};
pub use lifecycle::Shutdown;
