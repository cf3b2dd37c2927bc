//! Serve the marketing page on its own host name.
//!
//! The marketing site and the application share one deployment. Requests for
//! the configured marketing host get the bundled landing page; every other
//! request, including ones without a `Host`, goes on to the application.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use petclaims_config::RoutingConfig;
use std::sync::Arc;
use tracing::debug;

pub const LANDING_PAGE: &str = include_str!("../assets/landing.html");

#[derive(Clone, Debug, Default)]
pub struct HostRoutingState {
    /// Normalized with [`normalize_host`].
    marketing_host: Option<String>,
}

impl HostRoutingState {
    pub fn new(marketing_host: Option<&str>) -> Self {
        Self {
            marketing_host: marketing_host.map(normalize_host).filter(|h| !h.is_empty()),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.marketing_host.as_deref())
    }

    pub fn is_marketing_host(&self, host: &str) -> bool {
        self.marketing_host
            .as_deref()
            .is_some_and(|marketing| marketing == normalize_host(host))
    }
}

/// Lowercase, without port. `[::1]:8080` keeps its brackets.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        host.split(':').next().unwrap_or(host)
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// `Host` header, or the URI authority for HTTP/2 requests.
fn request_host(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().host())
}

pub async fn host_routing_middleware(
    State(state): State<Arc<HostRoutingState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(host) = request_host(&req) {
        if state.is_marketing_host(host) {
            debug!(host, path = %req.uri().path(), "Serving landing page");
            return Html(LANDING_PAGE).into_response();
        }
    }

    next.run(req).await
}
