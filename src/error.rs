//! Error taxonomy for the forwarding pipeline.
//!
//! Every step of request handling returns [`ProxyResult`]. The HTTP handler
//! unwraps it exactly once and turns any [`ProxyError`] into the fixed JSON
//! error shape via [`ProxyError::body`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::counter::CounterError;

/// Errors that can occur while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The target path is not valid percent-encoded UTF-8.
    #[error("URI malformed: {0}")]
    MalformedEncoding(String),

    /// The repaired target could not be parsed as an absolute URL.
    #[error("Invalid target URL {url}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading the inbound request body failed (including the size limit).
    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),

    /// Inbound body declared as JSON did not parse.
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound body declared as a form did not parse.
    #[error("Invalid form body: {0}")]
    Form(String),

    /// The outbound request failed in transport.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The request counter backend failed.
    #[error("Counter error: {0}")]
    Counter(#[from] CounterError),

    /// The help page template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Result type for forwarding operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// JSON body returned to the caller for any failed request.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "code": -1,
            "msg": self.to_string(),
        })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let err = ProxyError::MalformedEncoding("%zz".into());
        let body = err.body();
        assert_eq!(body["code"], -1);
        assert_eq!(body["msg"], "URI malformed: %zz");
    }

    #[tokio::test]
    async fn test_into_response() {
        let response = ProxyError::Form("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["content-type"], "application/json");

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"code": -1, "msg": "Invalid form body: bad"}));
    }

    #[test]
    fn test_error_display() {
        let err = ProxyError::Form("missing boundary".into());
        assert!(err.to_string().contains("missing boundary"));

        let err = ProxyError::from(CounterError::Corrupt("not json".into()));
        assert!(err.to_string().starts_with("Counter error"));
    }
}
