//! Embedded admin page (`/app/studio`).
//!
//! Rendered inside the Shopify admin. The shop id comes from the Admin API,
//! never from the request, so a merchant can only connect their own shop.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use interactive_studio_core::{Email, InteractiveSvg, Otp};

use crate::catalog;
use crate::error::AppError;
use crate::middleware::EmbeddedAdmin;
use crate::services::ValidationError;
use crate::state::AppState;

/// Studio page template.
#[derive(Template, WebTemplate)]
#[template(path = "studio.html")]
pub struct StudioPageTemplate {
    /// Verified email, when the shop is connected.
    pub connected_email: Option<String>,
    /// Gallery previews, shown only when connected.
    pub images: Vec<InteractiveSvg>,
}

/// Form posted by the studio page.
#[derive(Debug, Default, Deserialize)]
pub struct StudioForm {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// `GET /app/studio` - connection form or gallery.
///
/// # Errors
///
/// Returns 502 if the Admin API call fails and 500 if storage fails.
#[instrument(skip(state, admin), fields(shop = %admin.shop))]
pub async fn page(
    State(state): State<AppState>,
    admin: EmbeddedAdmin,
) -> Result<impl IntoResponse, AppError> {
    let shop_id = state.admin().shop_id().await?;
    let connection = state.connections().connection_state(shop_id.as_str()).await?;

    let connected_email = connection.email().map(ToString::to_string);
    let images = if connected_email.is_some() {
        catalog::available()
    } else {
        Vec::new()
    };

    Ok(StudioPageTemplate {
        connected_email,
        images,
    })
}

/// `POST /app/studio` - connect, verify or sync.
///
/// `connect-email` answers `success: false` because the shop is not
/// connected until the code is verified; `accepted` tells the page to show
/// the code step.
///
/// # Errors
///
/// Returns 400 for empty input (checked before any Admin API call), 502 if
/// the Admin API call fails and 500 if storage fails.
#[instrument(skip(state, admin, form), fields(shop = %admin.shop, kind = %form.kind))]
pub async fn action(
    State(state): State<AppState>,
    admin: EmbeddedAdmin,
    Form(form): Form<StudioForm>,
) -> Result<Response, AppError> {
    let response = match form.kind.as_str() {
        "connect-email" => {
            let email = Email::parse(&form.email).map_err(ValidationError::from)?;
            let shop_id = state.admin().shop_id().await?;
            let accepted = state
                .connections()
                .request_connection(shop_id.as_str(), email.as_str())
                .await?;
            Json(json!({ "success": false, "accepted": accepted.accepted })).into_response()
        }
        "verify-email" => {
            let otp = Otp::parse(&form.otp).map_err(ValidationError::from)?;
            let shop_id = state.admin().shop_id().await?;
            let result = state
                .connections()
                .verify_connection(shop_id.as_str(), otp.as_str())
                .await?;
            Json(result).into_response()
        }
        "sync-images" => {
            let synced = state
                .images()
                .upsert_many(&admin.shop, &catalog::available())
                .await?;
            tracing::info!(count = synced.len(), "Catalog synced");
            Json(json!({ "success": true, "synced": synced.len() })).into_response()
        }
        _ => Json(json!({ "success": false })).into_response(),
    };

    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unconnected_page_shows_connect_form() {
        let html = StudioPageTemplate {
            connected_email: None,
            images: Vec::new(),
        }
        .render()
        .unwrap();

        assert!(html.contains("connect-form"));
        assert!(!html.contains("Your gallery"));
    }

    #[test]
    fn test_connected_page_shows_gallery() {
        let html = StudioPageTemplate {
            connected_email: Some("a@x.com".to_string()),
            images: catalog::available(),
        }
        .render()
        .unwrap();

        assert!(html.contains("Welcome back"));
        assert!(html.contains("a@x.com"));
        assert!(html.contains("Your gallery"));
        assert!(html.contains("Hover Circle"));
        assert!(!html.contains("connect-form"));
    }

    #[test]
    fn test_form_defaults() {
        let form: StudioForm = serde_json::from_str(r#"{"type": "verify-email"}"#).unwrap();
        assert_eq!(form.kind, "verify-email");
        assert!(form.otp.is_empty());
    }
}
