//! Seed the catalog.
//!
//! Reads a YAML [`CatalogSeed`] (or generates demo data), validates it before
//! connecting, and inserts tags and products into `PostgreSQL`:
//!
//! ```yaml
//! tags: [linen, outerwear]
//! products:
//!   - name: Linen overshirt
//!     price: "59.00"
//!     image: [https://images.example/overshirt.jpg]
//!     tags: [linen, outerwear]
//! ```

use std::path::Path;

use tracing::{error, info};

use threadline_storefront::config::StorefrontConfig;
use threadline_storefront::db::{self, Database};
use threadline_storefront::seed::{CatalogSeed, seed_catalog};

use super::CliError;

/// Parse a seed document.
fn parse(content: &str) -> Result<CatalogSeed, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Seed from `file`, or `demo` generated products when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// no database URL is configured, or an insert fails.
pub async fn run(file: Option<&Path>, demo: usize) -> Result<(), CliError> {
    let seed = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog seed from file");
            parse(&tokio::fs::read_to_string(path).await?)?
        }
        None => {
            info!(count = demo, "Generating demo catalog");
            CatalogSeed::demo(demo)
        }
    };

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::InvalidSeed(errors.len()));
    }
    info!(
        tags = seed.tags.len(),
        products = seed.products.len(),
        "Seed validated"
    );

    let config = StorefrontConfig::from_env()?;
    let pool = db::create_pool(config.require_database_url()?).await?;
    info!("Connected to database");

    let report = seed_catalog(&Database::Postgres(pool), &seed).await?;

    info!("Seeding complete!");
    info!("  Tags created: {}", report.tags_created);
    info!("  Tags already present: {}", report.tags_existing);
    info!("  Products inserted: {}", report.products_inserted);
    Ok(())
}
