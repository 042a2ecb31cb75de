//! API gateway HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request id, access log span)
//!     → timeout.rs (JSON 408 past the request deadline)
//!     → body.rs (JSON / form parsing under the size cap)
//!     → routes.rs (built-in endpoints, route groups)
//!     → connection.rs (ensure database handle for route groups)
//!     → error.rs (JSON error bodies, panic recovery)
//! ```

pub mod body;
pub mod connection;
pub mod error;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod timeout;

pub use body::ParsedBody;
pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use routes::RouteGroups;
pub use server::{mongo_lifecycle, ApiServer};
