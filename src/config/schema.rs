//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the CORS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, public scheme).
    pub listener: ListenerConfig,

    /// CORS response header settings.
    pub cors: CorsConfig,

    /// Request counter backend.
    pub counter: CounterConfig,

    /// Help page content.
    pub help: HelpConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Scheme of the proxy's public URL ("http" or "https").
    /// `X-Forwarded-Proto` on the inbound request takes precedence.
    pub public_scheme: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_scheme: "https".to_string(),
        }
    }
}

/// Default value for `Access-Control-Allow-Headers`.
pub const DEFAULT_ALLOW_HEADERS: &str = "Accept, Authorization, Cache-Control, Content-Type, DNT, If-Modified-Since, Keep-Alive, Origin, User-Agent, X-Requested-With, Token, x-access-token";

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Sent as `Access-Control-Allow-Headers` when the caller does not supply one.
    pub default_allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            default_allow_headers: DEFAULT_ALLOW_HEADERS.to_string(),
        }
    }
}

/// Which store backs the request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// No store; the counter always reads zero.
    #[default]
    None,
    /// Process-local map.
    Memory,
    /// JSON file at `counter.path`.
    File,
}

/// Request counter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CounterConfig {
    pub backend: CounterBackend,

    /// Store file for the `file` backend.
    pub path: Option<String>,
}

/// Help page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Page title and welcome name.
    pub title: String,

    /// "Deploy your own!" link target.
    pub deploy_url: String,

    /// Source repository link target.
    pub repository_url: String,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            title: "CORS Proxy".to_string(),
            deploy_url: "https://github.com/streetwriters/cors#deploy".to_string(),
            repository_url: "https://github.com/streetwriters/cors".to_string(),
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` for outbound requests.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { system_proxy: true }
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size buffered for re-encoding, in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
