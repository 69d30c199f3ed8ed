//! Image repository for database operations.
//!
//! Images are per-shop copies of catalog templates, unique on
//! `(external_id, shop)`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use interactive_studio_core::{ImageId, InteractiveSvg};

use super::RepositoryError;

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Unique identifier.
    pub id: ImageId,
    /// Shop domain the image belongs to.
    #[serde(skip)]
    pub shop: String,
    /// Catalog template this image was synced from.
    #[serde(skip)]
    pub external_id: String,
    /// Display title.
    pub title: String,
    /// Interactive markup.
    pub svg_html: String,
    /// Static preview markup.
    pub preview_html: String,
    /// When the image was first synced.
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    /// When the image was last synced.
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i32,
    shop: String,
    external_id: String,
    title: String,
    svg_html: String,
    preview_html: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ImageId::new(row.id),
            shop: row.shop,
            external_id: row.external_id,
            title: row.title,
            svg_html: row.svg_html,
            preview_html: row.preview_html,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str =
    "id, shop, external_id, title, svg_html, preview_html, created_at, updated_at";

/// Repository for image database operations.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh catalog templates for a shop.
    ///
    /// Runs in one transaction so a shop never sees a partially synced
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    #[instrument(skip(self, templates), fields(count = templates.len()))]
    pub async fn upsert_many(
        &self,
        shop: &str,
        templates: &[InteractiveSvg],
    ) -> Result<Vec<Image>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut images = Vec::with_capacity(templates.len());

        for template in templates {
            let row = sqlx::query_as::<_, ImageRow>(&format!(
                r"
                INSERT INTO studio.image (shop, external_id, title, svg_html, preview_html)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (external_id, shop) DO UPDATE
                SET title = EXCLUDED.title,
                    svg_html = EXCLUDED.svg_html,
                    preview_html = EXCLUDED.preview_html,
                    updated_at = NOW()
                RETURNING {COLUMNS}
                "
            ))
            .bind(shop)
            .bind(&template.external_id)
            .bind(&template.title)
            .bind(&template.svg_html)
            .bind(&template.preview_html)
            .fetch_one(&mut *tx)
            .await?;

            images.push(row.into());
        }

        tx.commit().await?;
        Ok(images)
    }

    /// List a shop's images, most recently synced first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_shop(&self, shop: &str) -> Result<Vec<Image>, RepositoryError> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            r"
            SELECT {COLUMNS}
            FROM studio.image
            WHERE shop = $1
            ORDER BY updated_at DESC, id DESC
            "
        ))
        .bind(shop)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an image by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ImageId) -> Result<Option<Image>, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {COLUMNS} FROM studio.image WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
