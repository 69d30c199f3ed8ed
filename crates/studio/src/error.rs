//! Unified error handling for the studio server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{ConnectionError, ValidationError};
use crate::shopify::AdminShopifyError;

/// Application-level error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Connection workflow failed.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Request signature missing or invalid.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request is signed but not for this store.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Connection(ConnectionError::Validation(err))
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Connection(ConnectionError::Validation(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Connection(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller. Server-side detail stays in logs.
    fn public_message(&self) -> String {
        match self {
            Self::Connection(ConnectionError::Validation(e)) => e.to_string(),
            Self::BadRequest(m) | Self::Unauthorized(m) | Self::Forbidden(m) => m.clone(),
            Self::Shopify(_) => "External service error".to_string(),
            Self::Database(_) | Self::Connection(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        }

        let body = json!({ "success": false, "message": self.public_message() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use interactive_studio_core::{ShopId, ShopIdError};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_public_message_hides_server_detail() {
        let bad = AppError::BadRequest("missing blockId".to_string());
        assert_eq!(bad.public_message(), "missing blockId");

        let internal = AppError::Internal("pool exhausted".to_string());
        assert_eq!(internal.public_message(), "Internal server error");

        let upstream = AppError::Shopify(AdminShopifyError::Unauthorized("revoked".to_string()));
        assert_eq!(upstream.public_message(), "External service error");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Shopify(AdminShopifyError::RateLimited(2))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err = AppError::from(ValidationError::ShopId(ShopIdError::Empty));
        assert_eq!(err.public_message(), "shop id: shop id cannot be empty");
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_connection_error_status_codes() {
        let validation = ConnectionError::Validation(ValidationError::ShopId(ShopIdError::Empty));
        assert_eq!(
            get_status(AppError::Connection(validation)),
            StatusCode::BAD_REQUEST
        );

        let inconsistent = ConnectionError::Inconsistent {
            shop_id: ShopId::parse("shop1").unwrap(),
        };
        assert_eq!(
            get_status(AppError::Connection(inconsistent)),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let storage = ConnectionError::Storage(RepositoryError::NotFound);
        assert_eq!(
            get_status(AppError::Connection(storage)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
