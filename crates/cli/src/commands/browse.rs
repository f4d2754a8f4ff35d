//! Page through a running storefront's catalog.
//!
//! Drives a [`CatalogClient`] until the catalog is exhausted and logs every
//! product. With credentials, also logs in, hydrates the account's cart and
//! prices it against the loaded catalog.
//!
//! # Environment Variables
//!
//! - `THREADLINE_API_URL` - API base URL (default: <http://localhost:4000/api>)
//! - `THREADLINE_PAGE_LIMIT` - Products per page (default: 10)
//! - `THREADLINE_DELIVERY_FEE` - Flat fee for non-empty carts (default: 5)

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use threadline_client::{ApiClient, CatalogClient, ClientConfig, ShopSession, TracingNotifier};
use threadline_core::{TagId, TagRef};

use super::CliError;

/// Flags of the `browse` subcommand.
#[derive(Debug, Default)]
pub struct BrowseOptions {
    pub api_url: Option<String>,
    pub limit: Option<u32>,
    pub tags: Vec<i64>,
    /// Email and password.
    pub login: Option<(String, String)>,
}

/// Load the full catalog and log it.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a page fetch fails, or the
/// login is rejected.
pub async fn run(options: BrowseOptions) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = options.api_url {
        config.api_url = api_url;
    }
    if let Some(limit) = options.limit.filter(|limit| *limit > 0) {
        config.page_limit = limit;
    }

    let api = ApiClient::new(&config.api_url)?;
    let notifier = Arc::new(TracingNotifier);
    let catalog = CatalogClient::new(api.clone(), config.page_limit, notifier.clone());

    info!(api = %api.base_url(), limit = config.page_limit, "Loading catalog");
    let loaded = catalog.load_all().await?;

    let selected: HashSet<TagId> = options.tags.iter().copied().map(TagId::new).collect();
    let shown = catalog.filter_by_tags(&selected);
    for product in &shown {
        let tags: Vec<&str> = product.tags.iter().filter_map(TagRef::name).collect();
        info!(
            id = %product.id,
            price = %product.price,
            tags = ?tags,
            "{}",
            product.name
        );
    }
    info!(loaded, shown = shown.len(), "Catalog exhausted");

    if let Some((email, password)) = options.login {
        let mut session = ShopSession::new(api, notifier);
        session.login(&email, &password).await?;

        let ledger = session.ledger();
        for line in ledger.lines() {
            info!(
                product_id = %line.product_id,
                size = %line.size,
                color = %line.color,
                quantity = line.quantity,
                "cart line"
            );
        }
        info!(
            items = ledger.line_count(),
            subtotal = %ledger.compute_total(&catalog),
            total = %ledger.grand_total(&catalog, config.delivery_fee),
            "Cart priced"
        );

        session.logout().await;
    }

    Ok(())
}
