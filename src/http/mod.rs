//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all handler)
//!     → origin.rs (rebuild the absolute inbound URL)
//!     → forward::target (classify: help page or forward)
//!     → help.rs (usage page) | forward::relay (upstream fetch)
//!     → cors.rs (CORS headers on every reply)
//!     → Send to client
//! ```

pub mod cors;
pub mod help;
pub mod origin;
pub mod server;

pub use cors::CorsHeaders;
pub use origin::PublicOrigin;
pub use server::{AppState, HttpServer};
