//! CORS Proxy Library
//!
//! Forwards `https://proxyhost/<target-url>` to `<target-url>` and relays
//! the response with permissive CORS headers.

pub mod config;
pub mod counter;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use counter::RequestCounter;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
