//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap body size before handlers see it)
//!     → Pass to routing
//!
//! Outgoing response:
//!     → headers.rs (hardening headers, added when absent)
//! ```
//!
//! # Design Decisions
//! - Fail closed: oversized bodies are rejected, never truncated
//! - Handlers may override any hardening header they set themselves

pub mod headers;
pub mod limits;

pub use headers::{security_headers_middleware, SecurityHeaders};
pub use limits::{read_capped, BodyReadError};
