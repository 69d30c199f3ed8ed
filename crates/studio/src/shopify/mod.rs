//! Shopify Admin API client.
//!
//! The app uses the Admin API for three things: resolving the shop's id for
//! the embedded page, finding the app installation that owns metafields,
//! and writing each block's image selection as a metafield the theme reads.
//!
//! Operations implement `graphql_client::GraphQLQuery` (see [`queries`]) and
//! responses arrive as `graphql_client::Response`; HTTP goes through reqwest.

mod admin;
pub mod queries;

pub use admin::{AdminClient, IMAGE_SELECTION_NAMESPACE};

use thiserror::Error;

/// Errors from Admin API calls.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Top-level `errors` in the GraphQL response.
    #[error("GraphQL errors: {}", join_messages(.0))]
    GraphQL(Vec<graphql_client::Error>),

    /// The response parsed but is missing what the call needs.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP 429; carries `Retry-After` in seconds.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// `userErrors` from a mutation payload.
    #[error("User error: {0}")]
    UserError(String),
}

fn join_messages(errors: &[graphql_client::Error]) -> String {
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    messages.join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use graphql_client::PathFragment;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_graphql_errors_join_messages() {
        let errors: Vec<graphql_client::Error> = serde_json::from_value(json!([
            { "message": "Field 'shop' doesn't exist", "locations": [{ "line": 2, "column": 3 }] },
            { "message": "Access denied", "path": ["currentAppInstallation"] }
        ]))
        .unwrap();

        assert_eq!(
            errors[1].path,
            Some(vec![PathFragment::Key("currentAppInstallation".to_string())])
        );
        assert_eq!(errors[0].locations.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            AdminShopifyError::GraphQL(errors).to_string(),
            "GraphQL errors: Field 'shop' doesn't exist; Access denied"
        );
    }

    #[test]
    fn test_rate_limited_message() {
        let err = AdminShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
