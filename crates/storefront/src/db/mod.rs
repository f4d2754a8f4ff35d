//! Storage for the storefront.
//!
//! # Backends
//!
//! - `Postgres` - production. Schema `shop`:
//!   - `shop.user` - accounts, with the owner's whole cart in `cart_data JSONB`
//!   - `shop.product` - catalog, `BIGSERIAL` ids double as pagination cursors
//!   - `shop.tag`, `shop.product_tag` - explicit product/tag relation
//!   - `shop.order` - placed orders with priced line snapshots
//!   - `tower_sessions.session` - created by the session store migration
//! - `Memory` - process-local tables for development and tests. Selected when
//!   no database URL is configured.
//!
//! Repositories dispatch on the backend per call; neither backend wraps cart
//! mutations in a transaction (see [`carts`]). Placing an order is the one
//! write that touches the cart inside a transaction (see [`orders`]).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p threadline-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use memory::MemoryStore;
pub use orders::{NewOrder, OrderRepository};
pub use products::{NewProduct, ProductRepository};
pub use users::UserRepository;

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

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// The storage backend shared by all repositories.
#[derive(Clone)]
pub enum Database {
    Memory(Arc<MemoryStore>),
    Postgres(PgPool),
}

impl Database {
    /// A fresh, empty in-memory backend.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::default()))
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Check that the backend can serve queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if Postgres is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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

/// Map a unique-violation into `Conflict`, everything else into `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
