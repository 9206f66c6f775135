//! Outbound request construction and response relay.

use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};

use hyper::ext::ReasonPhrase;

use crate::config::UpstreamConfig;
use crate::error::ProxyResult;
use crate::forward::encoding::BodyEncoding;
use crate::forward::target::TargetUrl;
use crate::observability::metrics;

/// Inbound headers that are never copied to the upstream request.
///
/// Framing and host are regenerated by the outbound client. Compression is
/// negotiated (and decoded) by the client itself because only the
/// content type of the upstream response is relayed back.
const DROPPED_HEADERS: &[&str] = &[
    "content-length",
    "content-type",
    "host",
    "accept-encoding",
    // Hop-by-hop
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Sends forwarding requests upstream.
#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
    max_body_size: usize,
}

/// An upstream response, ready to be handed back to the caller.
#[derive(Debug)]
pub struct Relayed {
    pub status: StatusCode,
    /// Status text the upstream sent, when it differs from the canonical one.
    pub reason: Option<ReasonPhrase>,
    pub content_type: Option<HeaderValue>,
    pub body: Body,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        if let Some(reason) = self.reason {
            // hyper writes it into the HTTP/1 status line
            response.extensions_mut().insert(reason);
        }
        if let Some(ct) = self.content_type.filter(|ct| !ct.is_empty()) {
            response.headers_mut().insert(header::CONTENT_TYPE, ct);
        }
        response
    }
}

impl Relay {
    /// Create a relay with its own HTTP client.
    pub fn new(upstream: &UpstreamConfig, max_body_size: usize) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("cors-proxy/", env!("CARGO_PKG_VERSION")));
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self::with_client(builder.build()?, max_body_size))
    }

    pub fn with_client(client: reqwest::Client, max_body_size: usize) -> Self {
        Self {
            client,
            max_body_size,
        }
    }

    /// Forward `request` to `target` and return the upstream response.
    ///
    /// The response body is streamed, not buffered.
    pub async fn forward(&self, target: TargetUrl, request: Request<Body>) -> ProxyResult<Relayed> {
        let method = request.method().clone();
        let headers = outbound_headers(request.headers());

        let mut builder = self
            .client
            .request(method.clone(), target.into_url())
            .headers(headers);

        if BodyEncoding::method_carries_body(&method) {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let encoding = BodyEncoding::for_content_type(content_type);
            tracing::debug!(?encoding, "Re-encoding request body");

            let body = encoding.encode(request, self.max_body_size).await?;
            builder = body.apply(builder)?;
        }

        let start = Instant::now();
        let result = builder.send().await;
        metrics::record_upstream(start);
        let response = result?;

        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        tracing::debug!(status = %status, "Upstream responded");

        Ok(Relayed {
            status,
            reason,
            content_type,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}

/// Copy inbound headers, minus the ones the proxy must not leak.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if !DROPPED_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_headers_filtered() {
        let mut inbound = HeaderMap::new();
        inbound.insert("host", HeaderValue::from_static("proxy.dev"));
        inbound.insert("content-type", HeaderValue::from_static("application/json"));
        inbound.insert("content-length", HeaderValue::from_static("7"));
        inbound.insert("connection", HeaderValue::from_static("keep-alive"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert("accept-encoding", HeaderValue::from_static("gzip"));
        inbound.insert("authorization", HeaderValue::from_static("Bearer t"));
        inbound.append("x-tag", HeaderValue::from_static("a"));
        inbound.append("x-tag", HeaderValue::from_static("b"));

        let headers = outbound_headers(&inbound);
        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(headers.get_all("x-tag").iter().count(), 2);
    }

    #[test]
    fn test_relayed_into_response() {
        let relayed = Relayed {
            status: StatusCode::CREATED,
            reason: None,
            content_type: Some(HeaderValue::from_static("application/xml")),
            body: Body::from("<ok/>"),
        };
        let response = relayed.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");

        let relayed = Relayed {
            status: StatusCode::NO_CONTENT,
            reason: None,
            content_type: None,
            body: Body::empty(),
        };
        let response = relayed.into_response();
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(response.extensions().get::<ReasonPhrase>().is_none());
    }

    #[test]
    fn test_reason_phrase_carried() {
        let relayed = Relayed {
            status: StatusCode::from_u16(299).unwrap(),
            reason: Some(ReasonPhrase::from_static(b"Gone Fishing")),
            content_type: None,
            body: Body::empty(),
        };
        let response = relayed.into_response();
        assert_eq!(
            response.extensions().get::<ReasonPhrase>().unwrap().as_bytes(),
            b"Gone Fishing"
        );
    }
}
