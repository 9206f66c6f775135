//! Permissive CORS response headers, attached to every reply.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::schema::{CorsConfig, DEFAULT_ALLOW_HEADERS};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// Builds the CORS headers for a reply.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    default_allow_headers: HeaderValue,
}

impl CorsHeaders {
    pub fn from_config(config: &CorsConfig) -> Self {
        let default_allow_headers = HeaderValue::from_str(&config.default_allow_headers)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));
        Self {
            default_allow_headers,
        }
    }

    /// `Access-Control-Allow-Headers` value for a request.
    ///
    /// An inbound `Access-Control-Allow-Headers` is echoed back (multiple
    /// values joined); otherwise the configured default is used.
    pub fn allow_headers(&self, inbound: &HeaderMap) -> HeaderValue {
        let echoed: Vec<&str> = inbound
            .get_all(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .collect();

        if echoed.is_empty() {
            return self.default_allow_headers.clone();
        }
        HeaderValue::from_str(&echoed.join(", "))
            .unwrap_or_else(|_| self.default_allow_headers.clone())
    }

    /// CORS headers for the reply to a request with these headers.
    pub fn for_request(&self, inbound: &HeaderMap) -> CorsReply {
        CorsReply {
            allow_headers: self.allow_headers(inbound),
        }
    }
}

/// CORS headers computed up front, applied once the reply exists.
#[derive(Debug, Clone)]
pub struct CorsReply {
    allow_headers: HeaderValue,
}

impl CorsReply {
    /// Insert the CORS headers into `headers`, replacing existing ones.
    pub fn apply(self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers);
    }
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}
