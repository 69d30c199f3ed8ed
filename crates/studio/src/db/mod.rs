//! Database operations for the studio `PostgreSQL` schema.
//!
//! # Schema: `studio`
//!
//! ## Tables
//!
//! - `connected_store` - Email connections per shop (pending and activated)
//! - `image` - Interactive SVG images synced per shop
//! - `image_registration` - Image selected for each theme block
//!
//! # Migrations
//!
//! Migrations are stored in `crates/studio/migrations/` and run via:
//! ```bash
//! cargo run -p interactive-studio-cli -- migrate
//! ```

pub mod connections;
pub mod images;
pub mod memory;
pub mod registry;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use connections::{ConnectionStore, PgConnectionStore};
pub use images::{Image, ImageRepository};
pub use memory::MemoryConnectionStore;
pub use registry::{ImageRegistration, ImageRegistryRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A lookup expected at most one row but matched several.
    #[error("ambiguous lookup: {matches} rows matched")]
    Ambiguous {
        /// Number of matching rows.
        matches: usize,
    },
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
