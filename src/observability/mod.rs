//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handler and relay produce:
//!     → logging.rs (structured log events, request id per request)
//!     → metrics.rs (request outcomes, upstream latency)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
