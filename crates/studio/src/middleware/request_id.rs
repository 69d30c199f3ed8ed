//! Request correlation ids.
//!
//! Shopify's app proxy does not forward an `x-request-id`, so storefront
//! calls normally get a fresh UUID v4 here. Embedded admin calls may already
//! carry one from an upstream proxy, and that id is kept.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag the request span and Sentry scope with a request id and echo it back.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(fresh_id);

    let id_str = id.to_str().unwrap_or_default();
    tracing::Span::current().record("request_id", id_str);
    sentry::configure_scope(|scope| scope.set_tag("request_id", id_str));

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, id);
    response
}

fn fresh_id() -> HeaderValue {
    let mut buf = Uuid::encode_buffer();
    HeaderValue::from_str(Uuid::new_v4().hyphenated().encode_lower(&mut buf))
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
