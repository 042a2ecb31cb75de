//! Frontend host: static assets plus a reverse proxy for API traffic.

pub mod assets;
pub mod host;
pub mod proxy;

pub use assets::resolve_static_dir;
pub use host::FrontendHost;
pub use proxy::{ProxyError, ProxyState};
