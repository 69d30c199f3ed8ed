//! HTTP middleware and request extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Signature checks run per route as extractors ([`AppProxy`],
//! [`EmbeddedAdmin`]) so health checks stay unsigned.

pub mod request_id;
pub mod shopify_signature;

pub use request_id::request_id_middleware;
pub use shopify_signature::{AppProxy, EmbeddedAdmin, SignatureError};
