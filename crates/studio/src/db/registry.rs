//! Image registry: which image each theme block displays.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use interactive_studio_core::{ImageId, ImageRegistrationId};

use super::RepositoryError;

/// The image selected for one theme block of a shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegistration {
    pub id: ImageRegistrationId,
    pub shop: String,
    pub block_id: String,
    pub block_label: String,
    pub image_id: ImageId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRegistrationRow {
    id: i32,
    shop: String,
    block_id: String,
    block_label: String,
    image_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ImageRegistrationRow> for ImageRegistration {
    fn from(row: ImageRegistrationRow) -> Self {
        Self {
            id: ImageRegistrationId::new(row.id),
            shop: row.shop,
            block_id: row.block_id,
            block_label: row.block_label,
            image_id: ImageId::new(row.image_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, shop, block_id, block_label, image_id, created_at, updated_at";

/// Repository for image registrations.
pub struct ImageRegistryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRegistryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Select `image_id` for `(shop, block_id)`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// foreign key violation for an unknown image).
    #[instrument(skip(self))]
    pub async fn upsert(
        &self,
        shop: &str,
        block_id: &str,
        block_label: &str,
        image_id: ImageId,
    ) -> Result<ImageRegistration, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRegistrationRow>(&format!(
            r"
            INSERT INTO studio.image_registration (shop, block_id, block_label, image_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop, block_id) DO UPDATE
            SET block_label = EXCLUDED.block_label,
                image_id = EXCLUDED.image_id,
                updated_at = NOW()
            RETURNING {COLUMNS}
            "
        ))
        .bind(shop)
        .bind(block_id)
        .bind(block_label)
        .bind(image_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// The registration for `(shop, block_id)`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        shop: &str,
        block_id: &str,
    ) -> Result<Option<ImageRegistration>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRegistrationRow>(&format!(
            "SELECT {COLUMNS} FROM studio.image_registration WHERE shop = $1 AND block_id = $2"
        ))
        .bind(shop)
        .bind(block_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
