//! Studio configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STUDIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_API_SECRET` - App API secret, used to verify app proxy and admin signatures
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Offline Admin API access token for the store
//!
//! ## Optional
//! - `STUDIO_HOST` - Bind address (default: 127.0.0.1)
//! - `STUDIO_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `STUDIO_FIXED_OTP` - Issue this code for every connection request (development only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//!
//! ## Optional (SMTP - enables code delivery by email; all four must be set together)
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address
//! - `SMTP_PORT` - SMTP port (default: 587)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use interactive_studio_core::Otp;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2026-01";

/// Minimum Shannon entropy, in bits per character, for the app secret.
const SECRET_MIN_ENTROPY: f64 = 3.3;

/// Fragments that mark a copied-from-docs value rather than a real secret.
const PLACEHOLDERS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "secret", "password", "xxx", "todo",
    "insert", "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Studio application configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify app and Admin API configuration
    pub shopify: ShopifyConfig,
    /// Connection code settings
    pub connection: ConnectionConfig,
    /// SMTP configuration (optional - codes are logged when absent)
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the API secret and access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// App API secret (signs app proxy and admin requests)
    pub api_secret: SecretString,
    /// Offline Admin API access token
    pub admin_access_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("api_secret", &"[REDACTED]")
            .field("admin_access_token", &"[REDACTED]")
            .finish()
    }
}

/// Connection code settings.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// When set, every request is issued this code instead of a random one.
    pub fixed_otp: Option<Otp>,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl StudioConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = env::secret_with_fallback("STUDIO_DATABASE_URL", "DATABASE_URL")?;
        let host = env::parsed_or("STUDIO_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env::parsed_or("STUDIO_PORT", 3000)?;

        let shopify = ShopifyConfig::from_env()?;
        let connection = ConnectionConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let sentry_dsn = env::optional("SENTRY_DSN");
        let sentry_environment = env::optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env::parsed_or("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = env::parsed_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            shopify,
            connection,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_secret = env::required("SHOPIFY_API_SECRET")?;
        check_secret_strength("SHOPIFY_API_SECRET", &api_secret)?;

        Ok(Self {
            store: env::required("SHOPIFY_STORE")?,
            api_version: env::optional("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            api_secret: SecretString::from(api_secret),
            admin_access_token: SecretString::from(env::required("SHOPIFY_ADMIN_ACCESS_TOKEN")?),
        })
    }
}

impl ConnectionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let fixed_otp = match env::optional("STUDIO_FIXED_OTP") {
            Some(code) => Some(
                Otp::parse(&code).map_err(|e| ConfigError::invalid("STUDIO_FIXED_OTP", e))?,
            ),
            None => None,
        };
        Ok(Self { fixed_otp })
    }
}

impl EmailConfig {
    /// `None` when no SMTP variable is set; an error when only some are.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let vars = [
            env::optional("SMTP_HOST"),
            env::optional("SMTP_USERNAME"),
            env::optional("SMTP_PASSWORD"),
            env::optional("SMTP_FROM"),
        ];

        match vars {
            [None, None, None, None] => Ok(None),
            [Some(smtp_host), Some(smtp_username), Some(password), Some(from_address)] => {
                Ok(Some(Self {
                    smtp_host,
                    smtp_port: env::parsed_or("SMTP_PORT", 587)?,
                    smtp_username,
                    smtp_password: SecretString::from(password),
                    from_address,
                }))
            }
            _ => Err(ConfigError::InvalidEnvVar(
                "SMTP_*".to_string(),
                "SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD and SMTP_FROM must be set together"
                    .to_string(),
            )),
        }
    }
}

impl ConfigError {
    fn invalid(key: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidEnvVar(key.to_string(), err.to_string())
    }
}

/// Environment lookups. Blank values count as unset.
mod env {
    use std::str::FromStr;

    use secrecy::SecretString;

    use super::ConfigError;

    pub fn optional(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn required(key: &str) -> Result<String, ConfigError> {
        optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// `primary`, else `fallback` (Fly.io's postgres attach sets `DATABASE_URL`).
    pub fn secret_with_fallback(primary: &str, fallback: &str) -> Result<SecretString, ConfigError> {
        optional(primary)
            .or_else(|| optional(fallback))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary.to_string()))
    }

    pub fn parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        optional(key).map_or(Ok(default), |raw| {
            raw.trim().parse().map_err(|e| ConfigError::invalid(key, e))
        })
    }
}

/// Shannon entropy of `s` in bits per character.
fn entropy_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);

    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder values and secrets below [`SECRET_MIN_ENTROPY`].
fn check_secret_strength(key: &str, secret: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDERS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = entropy_per_char(secret);
    if entropy < SECRET_MIN_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("{entropy:.2} bits/char is below {SECRET_MIN_ENTROPY:.1}; generate a random secret"),
        ));
    }

    Ok(())
}
