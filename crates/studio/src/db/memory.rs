//! In-memory connection store.

use chrono::Utc;
use tokio::sync::RwLock;

use interactive_studio_core::{ConnectionId, ConnectionRecord, Email, Otp, ShopId};

use super::{ConnectionStore, RepositoryError};

/// A [`ConnectionStore`] held in process memory.
///
/// Mirrors the `PostgreSQL` store's semantics: `(shop_id, email)` is unique,
/// ids are assigned sequentially, and `find_activated` prefers the most
/// recently created record. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    records: Vec<ConnectionRecord>,
}

impl MemoryConnectionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records for a shop, in insertion order.
    pub async fn records_for(&self, shop_id: &ShopId) -> Vec<ConnectionRecord> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .filter(|r| &r.shop_id == shop_id)
            .cloned()
            .collect()
    }
}

impl ConnectionStore for MemoryConnectionStore {
    async fn upsert_pending(
        &self,
        shop_id: &ShopId,
        email: &Email,
        otp: &Otp,
    ) -> Result<ConnectionRecord, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if let Some(existing) = inner
            .records
            .iter_mut()
            .find(|r| &r.shop_id == shop_id && &r.email == email)
        {
            existing.otp = otp.clone();
            existing.activated = false;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let record = ConnectionRecord {
            id: ConnectionId::new(inner.next_id),
            shop_id: shop_id.clone(),
            email: email.clone(),
            otp: otp.clone(),
            activated: false,
            created_at: now,
            updated_at: now,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn find_pending_by_otp(
        &self,
        shop_id: &ShopId,
        otp: &Otp,
    ) -> Result<Option<ConnectionRecord>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut matches = inner
            .records
            .iter()
            .filter(|r| &r.shop_id == shop_id && &r.otp == otp && r.is_pending());

        let first = matches.next().cloned();
        let rest = matches.count();
        if rest > 0 {
            return Err(RepositoryError::Ambiguous { matches: rest + 1 });
        }
        Ok(first)
    }

    async fn activate(
        &self,
        shop_id: &ShopId,
        email: &Email,
    ) -> Result<ConnectionRecord, RepositoryError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.shop_id == shop_id && &r.email == email)
            .ok_or(RepositoryError::NotFound)?;

        record.activated = true;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn find_activated(
        &self,
        shop_id: &ShopId,
    ) -> Result<Option<ConnectionRecord>, RepositoryError> {
        Ok(self.list_activated(shop_id).await?.into_iter().next())
    }

    async fn list_activated(
        &self,
        shop_id: &ShopId,
    ) -> Result<Vec<ConnectionRecord>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut activated: Vec<ConnectionRecord> = inner
            .records
            .iter()
            .filter(|r| &r.shop_id == shop_id && r.activated)
            .cloned()
            .collect();
        activated.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id.as_i32())));
        Ok(activated)
    }
}
