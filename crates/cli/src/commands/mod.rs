//! Subcommand implementations.

pub mod browse;
pub mod migrate;
pub mod seed;

use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] threadline_storefront::config::ConfigError),

    #[error("Client configuration error: {0}")]
    ClientConfig(#[from] threadline_client::config::ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] threadline_storefront::db::RepositoryError),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    InvalidSeed(usize),

    #[error("API error: {0}")]
    Client(#[from] threadline_client::ClientError),
}
