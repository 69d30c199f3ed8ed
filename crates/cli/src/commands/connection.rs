//! Connection inspection commands.

use interactive_studio::db::{ConnectionStore, PgConnectionStore};
use interactive_studio_core::ShopId;

use super::{CommandError, connect};

/// Report the activated connection for `shop_id`, if any.
///
/// # Errors
///
/// Returns an error if the shop id is empty or the query fails.
pub async fn status(shop_id: &str) -> Result<(), CommandError> {
    let shop_id =
        ShopId::parse(shop_id).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;

    let pool = connect().await?;
    let store = PgConnectionStore::new(pool);

    match store.find_activated(&shop_id).await? {
        Some(record) => tracing::info!(
            "Shop {} is connected as {} (since {})",
            shop_id,
            record.email,
            record.updated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => tracing::info!("Shop {} has no verified connection", shop_id),
    }

    Ok(())
}
