//! Client configuration loaded from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `THREADLINE_API_URL` | `http://localhost:4000/api` |
//! | `THREADLINE_PAGE_LIMIT` | `10` |
//! | `THREADLINE_DELIVERY_FEE` | `5` |

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {name}: {reason}")]
    InvalidEnvVar { name: &'static str, reason: String },
}

/// Shop client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the JSON API, including the `/api` prefix.
    pub api_url: String,
    /// Products requested per catalog page.
    pub page_limit: u32,
    /// Flat fee added to non-empty carts.
    pub delivery_fee: Decimal,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4000/api".to_string(),
            page_limit: 10,
            delivery_fee: Decimal::from(5),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Ok(Self {
            api_url: parse_env::<Url>("THREADLINE_API_URL")?
                .map_or(defaults.api_url, String::from),
            page_limit: parse_env("THREADLINE_PAGE_LIMIT")?
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.page_limit),
            delivery_fee: parse_env("THREADLINE_DELIVERY_FEE")?.unwrap_or(defaults.delivery_fee),
        })
    }
}

fn parse_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
                name,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}
