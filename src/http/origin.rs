//! The proxy's own public origin.
//!
//! Handlers only see an origin-form request target (`/http://a.com/x`).
//! Target extraction and the help page both work on the absolute URL, so it
//! is rebuilt from the scheme and the `Host` header.

use axum::http::{header, HeaderMap, Uri};

/// Scheme and host the caller used to reach the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrigin {
    scheme: String,
    host: String,
}

impl PublicOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derive the origin from request headers.
    ///
    /// `X-Forwarded-Proto` wins over `default_scheme`; the host comes from
    /// `Host`, then the request URI authority, then `localhost`.
    pub fn from_parts(headers: &HeaderMap, uri: &Uri, default_scheme: &str) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default_scheme);

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Self::new(scheme, host)
    }

    /// `<scheme>://<host>`
    pub fn as_origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// The absolute URL of an inbound request.
    pub fn absolute_url(&self, uri: &Uri) -> String {
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.as_origin(), path)
    }
}
