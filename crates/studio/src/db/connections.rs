//! Connection store: durable records of email connections per shop.
//!
//! Writes are keyed by `(shop_id, email)`, reads by `shop_id`. Every
//! operation is a single statement, so each call is atomic per record.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use interactive_studio_core::{ConnectionId, ConnectionRecord, Email, Otp, ShopId};

use super::RepositoryError;

/// Storage for [`ConnectionRecord`]s.
///
/// Implemented by [`PgConnectionStore`] for production and by
/// [`super::MemoryConnectionStore`] for tests.
pub trait ConnectionStore: Send + Sync {
    /// Insert a pending record for `(shop_id, email)`, or overwrite the code
    /// of an existing one and reset it to pending.
    fn upsert_pending(
        &self,
        shop_id: &ShopId,
        email: &Email,
        otp: &Otp,
    ) -> impl Future<Output = Result<ConnectionRecord, RepositoryError>> + Send;

    /// Find the pending record for `shop_id` carrying `otp`.
    ///
    /// Returns [`RepositoryError::Ambiguous`] when more than one pending
    /// record matches.
    fn find_pending_by_otp(
        &self,
        shop_id: &ShopId,
        otp: &Otp,
    ) -> impl Future<Output = Result<Option<ConnectionRecord>, RepositoryError>> + Send;

    /// Mark the record for `(shop_id, email)` as activated.
    ///
    /// Activating an already activated record succeeds and leaves it
    /// activated. Returns [`RepositoryError::NotFound`] when no record exists.
    fn activate(
        &self,
        shop_id: &ShopId,
        email: &Email,
    ) -> impl Future<Output = Result<ConnectionRecord, RepositoryError>> + Send;

    /// The most recently created activated record for `shop_id`.
    fn find_activated(
        &self,
        shop_id: &ShopId,
    ) -> impl Future<Output = Result<Option<ConnectionRecord>, RepositoryError>> + Send;

    /// Every activated record for `shop_id`, most recently created first.
    fn list_activated(
        &self,
        shop_id: &ShopId,
    ) -> impl Future<Output = Result<Vec<ConnectionRecord>, RepositoryError>> + Send;
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct ConnectionRow {
    id: i32,
    shop_id: String,
    email: String,
    otp: String,
    activated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConnectionRow> for ConnectionRecord {
    type Error = RepositoryError;

    fn try_from(row: ConnectionRow) -> Result<Self, Self::Error> {
        let shop_id = ShopId::parse(&row.shop_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop id in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let otp = Otp::parse(&row.otp)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid code in database: {e}")))?;

        Ok(Self {
            id: ConnectionId::new(row.id),
            shop_id,
            email,
            otp,
            activated: row.activated,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, shop_id, email, otp, activated, created_at, updated_at";

/// `PostgreSQL`-backed connection store over `studio.connected_store`.
#[derive(Debug, Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    /// Create a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ConnectionStore for PgConnectionStore {
    #[instrument(skip(self, otp), fields(shop_id = %shop_id))]
    async fn upsert_pending(
        &self,
        shop_id: &ShopId,
        email: &Email,
        otp: &Otp,
    ) -> Result<ConnectionRecord, RepositoryError> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            r"
            INSERT INTO studio.connected_store (shop_id, email, otp, activated)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (shop_id, email) DO UPDATE
            SET otp = EXCLUDED.otp, activated = FALSE, updated_at = NOW()
            RETURNING {COLUMNS}
            "
        ))
        .bind(shop_id.as_str())
        .bind(email.as_str())
        .bind(otp.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self, otp), fields(shop_id = %shop_id))]
    async fn find_pending_by_otp(
        &self,
        shop_id: &ShopId,
        otp: &Otp,
    ) -> Result<Option<ConnectionRecord>, RepositoryError> {
        let mut rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r"
            SELECT {COLUMNS}
            FROM studio.connected_store
            WHERE shop_id = $1 AND otp = $2 AND activated = FALSE
            "
        ))
        .bind(shop_id.as_str())
        .bind(otp.as_str())
        .fetch_all(&self.pool)
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => rows.pop().map(TryInto::try_into).transpose(),
            matches => Err(RepositoryError::Ambiguous { matches }),
        }
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn activate(
        &self,
        shop_id: &ShopId,
        email: &Email,
    ) -> Result<ConnectionRecord, RepositoryError> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            r"
            UPDATE studio.connected_store
            SET activated = TRUE, updated_at = NOW()
            WHERE shop_id = $1 AND email = $2
            RETURNING {COLUMNS}
            "
        ))
        .bind(shop_id.as_str())
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn find_activated(
        &self,
        shop_id: &ShopId,
    ) -> Result<Option<ConnectionRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            r"
            SELECT {COLUMNS}
            FROM studio.connected_store
            WHERE shop_id = $1 AND activated = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(shop_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn list_activated(
        &self,
        shop_id: &ShopId,
    ) -> Result<Vec<ConnectionRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            r"
            SELECT {COLUMNS}
            FROM studio.connected_store
            WHERE shop_id = $1 AND activated = TRUE
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(shop_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
