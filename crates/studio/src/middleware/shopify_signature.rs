//! Verification of Shopify-signed requests.
//!
//! Two request shapes reach the studio with a Shopify signature in the
//! query string:
//!
//! - **App proxy** requests from the storefront carry `signature`: the hex
//!   HMAC-SHA256 of every other parameter rendered as `key=value` (repeated
//!   keys joined with `,`), sorted and concatenated with no separator.
//! - **Embedded admin** requests carry `hmac`: the hex HMAC-SHA256 of every
//!   other parameter rendered as `key=value`, sorted and joined with `&`.
//!
//! Both are keyed by the app's API secret and compared in constant time.

use std::collections::{BTreeMap, HashMap};

use axum::{extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use thiserror::Error;

use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of an app proxy request, in seconds.
pub const MAX_PROXY_AGE_SECS: i64 = 300;

/// Why a signed request was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} parameter")]
    Missing(&'static str),
    #[error("signature is not valid hex")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("request timestamp too old")]
    Expired,
}

/// Group query parameters by key, keeping repeated values in order.
fn group_params(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

fn verify_hex_hmac(secret: &[u8], message: &str, provided: &str) -> Result<(), SignatureError> {
    let provided = hex::decode(provided).map_err(|_| SignatureError::Malformed)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Mismatch)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)
}

/// The string Shopify signs for an app proxy request.
fn proxy_message(params: &BTreeMap<String, Vec<String>>) -> String {
    let mut rendered: Vec<String> = params
        .iter()
        .filter(|(key, _)| key.as_str() != "signature")
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect();
    rendered.sort();
    rendered.concat()
}

/// The string Shopify signs for an embedded admin request.
fn admin_message(params: &BTreeMap<String, Vec<String>>) -> String {
    let mut rendered: Vec<String> = params
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "hmac" | "signature"))
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect();
    rendered.sort();
    rendered.join("&")
}

/// Verify an app proxy query string and return its parameters.
///
/// `now` is the current Unix time in seconds.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the signature is absent, malformed or
/// wrong, or if the timestamp is more than [`MAX_PROXY_AGE_SECS`] away from
/// `now`.
pub fn verify_proxy_query(
    query: &str,
    secret: &[u8],
    now: i64,
) -> Result<HashMap<String, String>, SignatureError> {
    let params = group_params(query);

    let signature = params
        .get("signature")
        .and_then(|v| v.first())
        .ok_or(SignatureError::Missing("signature"))?;
    verify_hex_hmac(secret, &proxy_message(&params), signature)?;

    let timestamp: i64 = params
        .get("timestamp")
        .and_then(|v| v.first())
        .ok_or(SignatureError::Missing("timestamp"))?
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(timestamp) > MAX_PROXY_AGE_SECS.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    Ok(flatten(params))
}

/// Verify an embedded admin query string and return its parameters.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the `hmac` parameter is absent,
/// malformed or wrong.
pub fn verify_admin_query(
    query: &str,
    secret: &[u8],
) -> Result<HashMap<String, String>, SignatureError> {
    let params = group_params(query);

    let hmac = params
        .get("hmac")
        .and_then(|v| v.first())
        .ok_or(SignatureError::Missing("hmac"))?;
    verify_hex_hmac(secret, &admin_message(&params), hmac)?;

    Ok(flatten(params))
}

fn flatten(params: BTreeMap<String, Vec<String>>) -> HashMap<String, String> {
    params
        .into_iter()
        .map(|(key, values)| (key, values.join(",")))
        .collect()
}

/// A storefront request forwarded and signed by Shopify's app proxy.
#[derive(Debug, Clone)]
pub struct AppProxy {
    /// The shop's `myshopify.com` domain.
    pub shop: String,
    params: HashMap<String, String>,
}

impl AppProxy {
    /// A query parameter, if present.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl FromRequestParts<AppState> for AppProxy {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = state.config().shopify.api_secret.expose_secret();
        let query = parts.uri.query().unwrap_or_default();

        let mut params = verify_proxy_query(query, secret.as_bytes(), chrono::Utc::now().timestamp())
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected app proxy request");
                AppError::Unauthorized(e.to_string())
            })?;

        let shop = params
            .remove("shop")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing shop".to_string()))?;

        Ok(Self { shop, params })
    }
}

/// A request from the embedded admin page for the configured store.
#[derive(Debug, Clone)]
pub struct EmbeddedAdmin {
    /// The shop's `myshopify.com` domain.
    pub shop: String,
}

impl FromRequestParts<AppState> for EmbeddedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let shopify = &state.config().shopify;
        let query = parts.uri.query().unwrap_or_default();

        let mut params = verify_admin_query(query, shopify.api_secret.expose_secret().as_bytes())
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected embedded admin request");
                AppError::Unauthorized(e.to_string())
            })?;

        let shop = params.remove("shop").unwrap_or_default();
        if shop != shopify.store {
            tracing::warn!(shop = %shop, "Embedded admin request for another store");
            return Err(AppError::Forbidden("unknown shop".to_string()));
        }

        Ok(Self { shop })
    }
}

/// Sign `params` the way Shopify signs app proxy requests.
///
/// Returns the full query string including `signature`.
#[must_use]
pub fn sign_proxy_query(params: &[(&str, &str)], secret: &[u8]) -> String {
    sign(params, secret, "signature", proxy_message)
}

/// Sign `params` the way Shopify signs embedded admin requests.
///
/// Returns the full query string including `hmac`.
#[must_use]
pub fn sign_admin_query(params: &[(&str, &str)], secret: &[u8]) -> String {
    sign(params, secret, "hmac", admin_message)
}

fn sign(
    params: &[(&str, &str)],
    secret: &[u8],
    signature_key: &str,
    message: fn(&BTreeMap<String, Vec<String>>) -> String,
) -> String {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in params {
        grouped
            .entry((*key).to_string())
            .or_default()
            .push((*value).to_string());
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(params.iter().copied());

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return serializer.finish();
    };
    mac.update(message(&grouped).as_bytes());
    serializer.append_pair(signature_key, &hex::encode(mac.finalize().into_bytes()));
    serializer.finish()
}
