//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (tracing, body limit)
//! - Run the per-request pipeline inside one failure boundary
//! - Attach CORS headers to every reply

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::counter::RequestCounter;
use crate::error::ProxyResult;
use crate::forward::{extract_target, Extraction, Relay};
use crate::http::cors::CorsHeaders;
use crate::http::help::render_help;
use crate::http::origin::PublicOrigin;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{self, Outcome};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub relay: Relay,
    pub counter: RequestCounter,
    pub cors: CorsHeaders,
}

impl AppState {
    /// Build the state with an explicit counter.
    pub fn new(config: ProxyConfig, counter: RequestCounter) -> Result<Self, reqwest::Error> {
        let relay = Relay::new(&config.upstream, config.limits.max_body_size)?;
        let cors = CorsHeaders::from_config(&config.cors);
        Ok(Self {
            config: Arc::new(config),
            relay,
            counter,
            cors,
        })
    }
}

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server whose counter backend comes from the configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let counter = RequestCounter::from_config(&config.counter);
        Self::with_counter(config, counter)
    }

    /// Create a server with an injected counter.
    pub fn with_counter(config: ProxyConfig, counter: RequestCounter) -> Result<Self, reqwest::Error> {
        let state = AppState::new(config, counter)?;
        let config = state.config.clone();
        Ok(Self {
            router: Self::build_router(state),
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every method and path reaches the proxy handler.
    pub fn build_router(state: AppState) -> Router {
        let max_body_size = state.config.limits.max_body_size;
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(max_body_size))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for driving the service directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_scheme = %self.config.listener.public_scheme,
            counter_backend = ?self.config.counter.backend,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.notified())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
///
/// Produces exactly one response per request: help page (200/400), the
/// relayed upstream response, or the JSON error body (500).
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id,
        method = %request.method(),
    );

    async move {
        let cors = state.cors.for_request(request.headers());
        let origin = PublicOrigin::from_parts(
            request.headers(),
            request.uri(),
            &state.config.listener.public_scheme,
        );

        let (mut response, outcome) = match handle(&state, &origin, request).await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                (e.into_response(), Outcome::Error)
            }
        };

        cors.apply(response.headers_mut());
        metrics::record_request(outcome, start);
        tracing::debug!(
            status = %response.status(),
            outcome = outcome.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

async fn handle(
    state: &AppState,
    origin: &PublicOrigin,
    request: Request<Body>,
) -> ProxyResult<(Response, Outcome)> {
    let inbound_url = origin.absolute_url(request.uri());

    match extract_target(request.method(), &inbound_url)? {
        Extraction::Landing => {
            let response = help_response(state, origin, StatusCode::OK).await?;
            Ok((response, Outcome::Help))
        }
        Extraction::Malformed => {
            tracing::debug!(url = %inbound_url, "Not a forwardable target");
            let response = help_response(state, origin, StatusCode::BAD_REQUEST).await?;
            Ok((response, Outcome::Malformed))
        }
        Extraction::Forward(target) => {
            tracing::info!(upstream = %target, "Forwarding request");
            let relayed = state.relay.forward(target, request).await?;
            // Only a completed upstream fetch counts
            state.counter.increment().await?;
            Ok((relayed.into_response(), Outcome::Relayed))
        }
    }
}

async fn help_response(
    state: &AppState,
    origin: &PublicOrigin,
    status: StatusCode,
) -> ProxyResult<Response> {
    let total = state.counter.read().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Counter unavailable, rendering zero");
        0
    });
    let page = render_help(&state.config.help, origin, total)?;
    Ok((status, Html(page)).into_response())
}
