//! Image catalog commands.

use interactive_studio::{catalog, db::ImageRepository};

use super::{CommandError, connect};

/// Insert or refresh the built-in templates for `shop`.
///
/// # Errors
///
/// Returns an error if the shop is empty or the database write fails.
pub async fn sync(shop: &str) -> Result<usize, CommandError> {
    let shop = shop.trim();
    if shop.is_empty() {
        return Err(CommandError::InvalidArgument("shop cannot be empty".to_owned()));
    }

    let pool = connect().await?;
    let images = ImageRepository::new(&pool)
        .upsert_many(shop, &catalog::available())
        .await?;

    for image in &images {
        tracing::info!("Synced image {} ({})", image.id, image.title);
    }
    tracing::info!("Catalog synced for {}: {} images", shop, images.len());

    Ok(images.len())
}
