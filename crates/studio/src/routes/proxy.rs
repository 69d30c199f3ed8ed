//! App proxy route handlers.
//!
//! The theme extension reaches the studio through Shopify's app proxy. Every
//! request is signed by Shopify (see [`AppProxy`]) and carries the shop
//! domain as `shop`. The extension adds `type` plus per-type parameters.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use interactive_studio_core::ImageId;

use crate::db::Image;
use crate::error::AppError;
use crate::middleware::AppProxy;
use crate::state::AppState;

/// Response for `determine-render-context`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    pub is_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_image: Option<Image>,
}

/// Body of a block's image selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSelection {
    pub image_id: ImageIdInput,
    pub block_id: String,
    #[serde(default)]
    pub block_label: String,
}

/// The theme editor sends image ids as numbers or numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImageIdInput {
    Number(ImageId),
    Text(String),
}

impl ImageIdInput {
    fn parse(&self) -> Result<ImageId, AppError> {
        match self {
            Self::Number(id) => Ok(*id),
            Self::Text(s) => s
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid imageId: {s}"))),
        }
    }
}

/// `GET /proxy` - dispatch on the `type` parameter.
///
/// Unknown types return `{}`.
///
/// # Errors
///
/// Returns 400 for missing or empty input, 500 if storage fails.
#[instrument(skip(state, proxy), fields(shop = %proxy.shop, kind = tracing::field::Empty))]
pub async fn handle(State(state): State<AppState>, proxy: AppProxy) -> Result<Response, AppError> {
    let kind = proxy.param("type").unwrap_or_default();
    tracing::Span::current().record("kind", kind);

    let response = match kind {
        "connect-email" => {
            state
                .connections()
                .request_connection(
                    proxy.param("shopId").unwrap_or_default(),
                    proxy.param("email").unwrap_or_default(),
                )
                .await?;
            Json(json!({ "success": true })).into_response()
        }
        "verify-email" => {
            let result = state
                .connections()
                .verify_connection(
                    proxy.param("shopId").unwrap_or_default(),
                    proxy.param("otp").unwrap_or_default(),
                )
                .await?;
            Json(result).into_response()
        }
        "determine-render-context" => Json(render_context(&state, &proxy).await?).into_response(),
        "load-image" => {
            let images = state.images().list_for_shop(&proxy.shop).await?;
            Json(json!({ "images": images })).into_response()
        }
        "load-selected-image" => {
            let image = load_selected_image(&state, &proxy).await?;
            Json(json!({ "image": image })).into_response()
        }
        _ => Json(json!({})).into_response(),
    };

    Ok(response)
}

/// `GET /proxy/images` - every image synced for the shop.
///
/// # Errors
///
/// Returns 500 if the database query fails.
#[instrument(skip(state, proxy), fields(shop = %proxy.shop))]
pub async fn images(
    State(state): State<AppState>,
    proxy: AppProxy,
) -> Result<impl IntoResponse, AppError> {
    let images = state.images().list_for_shop(&proxy.shop).await?;
    Ok(Json(json!({ "images": images })))
}

/// `POST /proxy` - assign an image to a theme block.
///
/// The choice is stored in the registry, then mirrored into the app
/// installation's `image_selections` metafield so Liquid can read it.
///
/// # Errors
///
/// Returns 403 when the proxied shop is not the configured store, 400 for a
/// malformed body or an image the shop does not own, 500 if storage fails
/// and 502 if the Admin API call fails.
#[instrument(skip(state, proxy, selection), fields(shop = %proxy.shop, block_id = %selection.block_id))]
pub async fn select_image(
    State(state): State<AppState>,
    proxy: AppProxy,
    Json(selection): Json<ImageSelection>,
) -> Result<impl IntoResponse, AppError> {
    if proxy.shop != state.config().shopify.store {
        tracing::warn!("Image selection for another store");
        return Err(AppError::Forbidden("unknown shop".to_string()));
    }

    let image_id = selection.image_id.parse()?;
    let block_id = selection.block_id.trim();
    if block_id.is_empty() {
        return Err(AppError::BadRequest("missing blockId".to_string()));
    }

    let image = owned_image(state.images().get(image_id).await?, &proxy.shop, image_id)?;

    state
        .registry()
        .upsert(&proxy.shop, block_id, &selection.block_label, image_id)
        .await?;

    let owner_id = state.admin().app_installation_id().await?;
    state
        .admin()
        .set_image_selection(&owner_id, block_id, image_id)
        .await?;

    tracing::info!(image_id = %image.id, "Image selection saved");
    Ok(Json(json!({})))
}

/// The image must exist and belong to `shop`.
fn owned_image(image: Option<Image>, shop: &str, id: ImageId) -> Result<Image, AppError> {
    image
        .filter(|i| i.shop == shop)
        .ok_or_else(|| AppError::BadRequest(format!("unknown imageId: {id}")))
}

async fn render_context(state: &AppState, proxy: &AppProxy) -> Result<RenderContext, AppError> {
    let connection = state
        .connections()
        .connection_state(proxy.param("shopId").unwrap_or_default())
        .await?;

    if !connection.is_connected() {
        return Ok(RenderContext {
            is_connected: false,
            images: None,
            selected_image: None,
        });
    }

    let images = state.images().list_for_shop(&proxy.shop).await?;

    let selected_image = match proxy.param("blockId").filter(|b| !b.is_empty()) {
        Some(block_id) => state
            .registry()
            .get(&proxy.shop, block_id)
            .await?
            .and_then(|registration| images.iter().find(|i| i.id == registration.image_id))
            .cloned(),
        None => None,
    };

    Ok(RenderContext {
        is_connected: true,
        images: Some(images),
        selected_image,
    })
}

async fn load_selected_image(state: &AppState, proxy: &AppProxy) -> Result<Option<Image>, AppError> {
    let raw = proxy.param("id").unwrap_or_default();
    let id: ImageId = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {raw}")))?;

    let image = state.images().get(id).await?;
    Ok(image.filter(|i| i.shop == proxy.shop))
}
