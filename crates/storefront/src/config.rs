//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the in-memory backend is used)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 4000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:4000>)
//! - `CATALOG_DEFAULT_PAGE_LIMIT` - Page size when `limit` is absent (default: 10)
//! - `CATALOG_MAX_PAGE_LIMIT` - Upper clamp for `limit` (default: 100)
//! - `CATALOG_HAS_MORE_POLICY` - `lookahead` (default) or `naive`
//! - `ORDER_DELIVERY_FEE` - Flat fee added to every non-empty order (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How the catalog decides whether another page exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HasMorePolicy {
    /// Fetch `limit + 1` rows; more pages exist iff the extra row came back.
    #[default]
    LookAhead,
    /// Any non-empty page claims more pages exist. A page that exactly
    /// exhausts the collection therefore reports `true`, and the client pays
    /// one extra round trip for an empty page.
    Naive,
}

impl FromStr for HasMorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lookahead" | "look-ahead" | "look_ahead" => Ok(Self::LookAhead),
            "naive" => Ok(Self::Naive),
            other => Err(format!("unknown policy '{other}' (expected lookahead or naive)")),
        }
    }
}

/// Catalog pagination settings.
#[derive(Debug, Clone, Copy)]
pub struct CatalogConfig {
    /// Page size used when the request has no usable `limit`.
    pub default_page_limit: u32,
    /// Largest page size served; larger requests are clamped.
    pub max_page_limit: u32,
    pub has_more_policy: HasMorePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 10,
            max_page_limit: 100,
            has_more_policy: HasMorePolicy::LookAhead,
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password). `None`
    /// selects the in-memory backend.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog pagination settings
    pub catalog: CatalogConfig,
    /// Flat fee added to every non-empty order
    pub delivery_fee: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 4000,
            base_url: "http://localhost:4000".to_string(),
            catalog: CatalogConfig::default(),
            delivery_fee: Decimal::from(5),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_optional_env("STOREFRONT_DATABASE_URL")
            .or_else(|| get_optional_env("DATABASE_URL"))
            .map(SecretString::from);
        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "4000")?;
        let base_url = get_optional_env("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| "http://localhost:4000".to_string());

        let catalog = CatalogConfig::from_env()?;
        let delivery_fee: Decimal = parse_env_or_default("ORDER_DELIVERY_FEE", "5")?;
        if delivery_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_DELIVERY_FEE".to_string(),
                "delivery fee must not be negative".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            catalog,
            delivery_fee,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The database URL, for commands that cannot run against memory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when no database is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_page_limit: u32 = parse_env_or_default("CATALOG_DEFAULT_PAGE_LIMIT", "10")?;
        let max_page_limit: u32 = parse_env_or_default("CATALOG_MAX_PAGE_LIMIT", "100")?;
        let has_more_policy = parse_env_or_default("CATALOG_HAS_MORE_POLICY", "lookahead")?;

        if default_page_limit == 0 || max_page_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_DEFAULT_PAGE_LIMIT".to_string(),
                "page limits must be positive".to_string(),
            ));
        }

        Ok(Self {
            default_page_limit: default_page_limit.min(max_page_limit),
            max_page_limit,
            has_more_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
