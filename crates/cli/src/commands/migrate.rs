//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and creates the session-store
//! table. The storefront never migrates on startup.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use tower_sessions_sqlx_store::PostgresStore;

use threadline_storefront::config::StorefrontConfig;
use threadline_storefront::db;

use super::CliError;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the connection fails,
/// or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
