//! Integration test harness for Threadline.
//!
//! [`TestServer`] runs the real storefront router on an ephemeral port with
//! the in-memory backend, so the shop client is exercised over actual HTTP
//! (cookies, JSON envelopes, status codes) without a database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p threadline-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use threadline_client::{ApiClient, CollectingNotifier};
use threadline_storefront::config::{HasMorePolicy, StorefrontConfig};
use threadline_storefront::db::Database;
use threadline_storefront::seed::{CatalogSeed, seed_catalog};
use threadline_storefront::state::AppState;

/// Password that satisfies the storefront's length rule.
pub const PASSWORD: &str = "correct horse battery";

/// A storefront serving on `127.0.0.1` until dropped.
pub struct TestServer {
    addr: SocketAddr,
    db: Database,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Storefront with `products` demo products and the default page policy.
    pub async fn spawn(products: usize) -> Self {
        Self::spawn_with(CatalogSeed::demo(products), HasMorePolicy::LookAhead).await
    }

    /// Storefront seeded with `seed`, paging with `policy`.
    pub async fn spawn_with(seed: CatalogSeed, policy: HasMorePolicy) -> Self {
        let db = Database::memory();
        seed_catalog(&db, &seed).await.expect("seed catalog");

        let mut config = StorefrontConfig::default();
        config.catalog.has_more_policy = policy;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let app = threadline_storefront::app(AppState::new(config, db.clone()));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("storefront server");
        });

        Self { addr, db, handle }
    }

    /// `http://127.0.0.1:<port>/api`
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// `http://127.0.0.1:<port>` + `path`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Backing storage, for assertions and fixture changes.
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    /// A fresh client (own cookie jar) for this server.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_url()).expect("api client")
    }

    /// A fresh client already registered (and so logged in) as `email`.
    pub async fn shopper(&self, email: &str) -> ApiClient {
        let api = self.client();
        api.register(email, PASSWORD).await.expect("register shopper");
        api
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A notifier whose notices tests can inspect.
#[must_use]
pub fn notifier() -> Arc<CollectingNotifier> {
    Arc::new(CollectingNotifier::new())
}
