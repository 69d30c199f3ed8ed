//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health              - Liveness check
//! GET  /health/ready        - Readiness check (database)
//!
//! # App proxy (signed by Shopify, `signature` query parameter)
//! GET  /proxy?type=...      - Connection, render context and image lookups
//! POST /proxy               - Assign an image to a theme block
//! GET  /proxy/images        - All images synced for the shop
//!
//! # Embedded admin (signed by Shopify, `hmac` query parameter)
//! GET  /app/studio          - Connection form or gallery
//! POST /app/studio          - connect-email, verify-email, sync-images
//! ```

pub mod health;
pub mod proxy;
pub mod studio;

use axum::{
    Router,
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the app proxy routes router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(proxy::handle).post(proxy::select_image))
        .route("/images", get(proxy::images))
}

/// Build the full application router with tracing and request ids.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/proxy", proxy_routes())
        .route("/app/studio", get(studio::page).post(studio::action))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
