//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound absolute URL
//!     → target.rs (strip origin, percent-decode, classify, scheme repair)
//!     → relay.rs (filter headers, build outbound request)
//!     → encoding.rs (re-encode body by content type, body-carrying methods only)
//!     → upstream fetch
//!     → relay.rs (status + reason phrase + content-type + streamed body)
//! ```
//!
//! # Design Decisions
//! - No retries, no timeouts: a transport failure surfaces immediately
//! - The response body is streamed back, never buffered
//! - Only `content-type` is copied from the upstream response headers

pub mod encoding;
pub mod relay;
pub mod target;

pub use encoding::{BodyEncoding, OutboundBody};
pub use relay::{outbound_headers, Relay, Relayed};
pub use target::{extract_target, Extraction, TargetUrl};
