//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StudioConfig;
use crate::db::{ImageRegistryRepository, ImageRepository, PgConnectionStore};
use crate::services::{CodeGenerator, CodeMailer, ConnectionWorkflow, EmailError, EmailService};
use crate::shopify::AdminClient;

/// The connection workflow as wired for the server.
pub type Connections = ConnectionWorkflow<PgConnectionStore, CodeGenerator, CodeMailer>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StudioConfig,
    pool: PgPool,
    admin: AdminClient,
    connections: Connections,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Codes are mailed over SMTP when configured and logged otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be configured.
    pub fn new(config: StudioConfig, pool: PgPool) -> Result<Self, EmailError> {
        let admin = AdminClient::new(&config.shopify);

        let mailer = match &config.email {
            Some(email_config) => CodeMailer::Smtp(EmailService::new(email_config)?),
            None => {
                tracing::warn!("SMTP not configured - connection codes will be logged");
                CodeMailer::Log
            }
        };
        let issuer = CodeGenerator::from_config(config.connection.fixed_otp.clone());
        if matches!(issuer, CodeGenerator::Fixed(_)) {
            tracing::warn!("STUDIO_FIXED_OTP is set - every connection request gets the same code");
        }

        let connections = ConnectionWorkflow::new(PgConnectionStore::new(pool.clone()), issuer, mailer);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                admin,
                connections,
            }),
        })
    }

    /// Get a reference to the studio configuration.
    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn admin(&self) -> &AdminClient {
        &self.inner.admin
    }

    /// Get a reference to the email connection workflow.
    #[must_use]
    pub fn connections(&self) -> &Connections {
        &self.inner.connections
    }

    #[must_use]
    pub fn images(&self) -> ImageRepository<'_> {
        ImageRepository::new(&self.inner.pool)
    }

    #[must_use]
    pub fn registry(&self) -> ImageRegistryRepository<'_> {
        ImageRegistryRepository::new(&self.inner.pool)
    }
}
