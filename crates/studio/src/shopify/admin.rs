//! Shopify Admin API GraphQL client.

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use interactive_studio_core::{ImageId, ShopId};

use super::AdminShopifyError;
use super::queries::{
    CurrentAppInstallation, NoVariables, SetImageSelection, ShopIdQuery,
    set_image_selection::{self, MetafieldsSetInput, UserError},
};
use crate::config::ShopifyConfig;

/// Metafield namespace holding one `single_line_text_field` per theme block.
pub const IMAGE_SELECTION_NAMESPACE: &str = "image_selections";

/// Shopify Admin API GraphQL client.
///
/// Authenticates with the store's offline access token.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                endpoint: format!(
                    "https://{}/admin/api/{}/graphql.json",
                    config.store, config.api_version
                ),
                access_token: config.admin_access_token.clone(),
            }),
        }
    }

    /// Resolve the numeric id of the shop the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the id is not a shop
    /// global id.
    #[instrument(skip(self))]
    pub async fn shop_id(&self) -> Result<ShopId, AdminShopifyError> {
        let data = self.execute::<ShopIdQuery>(NoVariables {}).await?;
        ShopId::from_gid(&data.shop.id)
            .map_err(|e| AdminShopifyError::InvalidResponse(e.to_string()))
    }

    /// Global id of this app's installation on the shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn app_installation_id(&self) -> Result<String, AdminShopifyError> {
        let data = self
            .execute::<CurrentAppInstallation>(NoVariables {})
            .await?;
        Ok(data.current_app_installation.id)
    }

    /// Store `image_id` as the selection for `block_id` on `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` if Shopify rejects the input,
    /// or another error if the API request fails.
    #[instrument(skip(self))]
    pub async fn set_image_selection(
        &self,
        owner_id: &str,
        block_id: &str,
        image_id: ImageId,
    ) -> Result<(), AdminShopifyError> {
        let variables = set_image_selection::Variables {
            metafields: vec![MetafieldsSetInput {
                namespace: IMAGE_SELECTION_NAMESPACE.to_string(),
                key: block_id.to_string(),
                type_: "single_line_text_field".to_string(),
                value: image_id.to_string(),
                owner_id: owner_id.to_string(),
            }],
        };

        let data = self.execute::<SetImageSelection>(variables).await?;
        let payload = data.metafields_set.ok_or_else(|| {
            AdminShopifyError::InvalidResponse("metafieldsSet returned null".to_string())
        })?;

        if !payload.user_errors.is_empty() {
            return Err(AdminShopifyError::UserError(format_user_errors(
                &payload.user_errors,
            )));
        }

        Ok(())
    }

    /// Execute a GraphQL operation and unwrap its `data`.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let graphql_response: Response<Q::ResponseData> = response.json().await?;
        into_data(graphql_response)
    }
}

fn into_data<T>(response: Response<T>) -> Result<T, AdminShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        return Err(AdminShopifyError::GraphQL(errors));
    }
    response
        .data
        .ok_or_else(|| AdminShopifyError::InvalidResponse("no data in response".to_string()))
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
