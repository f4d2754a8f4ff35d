//! Incremental catalog consumer.
//!
//! Pages are requested one visibility signal at a time ("the last rendered
//! product scrolled into view") and appended to an accumulated list. At most
//! one fetch is in flight per client. The background fetch only holds a weak
//! reference to the client state, so a response that arrives after the
//! client was dropped is discarded.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use threadline_core::{PriceLookup, Product, ProductId, ProductListResponse, TagId};

use crate::api::ProductSource;
use crate::error::ClientError;
use crate::notify::{Notice, Notifier};

/// Permission to fetch the page after `cursor`; holding one means the
/// in-flight slot is taken.
#[derive(Debug, Clone, Copy)]
struct FetchTicket {
    cursor: Option<ProductId>,
}

#[derive(Debug)]
struct CatalogState {
    products: Vec<Product>,
    cursor: Option<ProductId>,
    has_more: bool,
    in_flight: bool,
}

impl CatalogState {
    const fn new() -> Self {
        Self {
            products: Vec::new(),
            cursor: None,
            has_more: true,
            in_flight: false,
        }
    }

    /// Claim the in-flight slot, or `None` when a fetch is already running
    /// or the catalog is exhausted.
    const fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.in_flight || !self.has_more {
            return None;
        }
        self.in_flight = true;
        Some(FetchTicket {
            cursor: self.cursor,
        })
    }

    /// Release the in-flight slot and fold in a successful page.
    fn apply_page(&mut self, page: ProductListResponse) -> usize {
        self.in_flight = false;
        let added = page.products.len();
        self.products.extend(page.products);
        self.has_more = page.has_more;
        if let Some(next) = page.next_cursor {
            self.cursor = Some(next);
        }
        added
    }

    /// Release the in-flight slot after a failed fetch; cursor and `has_more`
    /// stay as they were so the next signal retries the same page.
    const fn abort_fetch(&mut self) {
        self.in_flight = false;
    }
}

fn lock(state: &Mutex<CatalogState>) -> MutexGuard<'_, CatalogState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accumulates catalog pages from a [`ProductSource`].
pub struct CatalogClient<S> {
    state: Arc<Mutex<CatalogState>>,
    source: Arc<S>,
    limit: u32,
    notifier: Arc<dyn Notifier>,
}

impl<S: ProductSource> CatalogClient<S> {
    /// A client with nothing loaded yet, requesting `limit` products per page.
    #[must_use]
    pub fn new(source: S, limit: u32, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CatalogState::new())),
            source: Arc::new(source),
            limit,
            notifier,
        }
    }

    /// Visibility signal for the last rendered product.
    ///
    /// Starts a background fetch of the next page unless one is already in
    /// flight or the catalog is exhausted, in which case this is a no-op and
    /// returns `None`. Must be called within a Tokio runtime.
    pub fn on_last_item_visible(&self) -> Option<JoinHandle<()>> {
        let FetchTicket { cursor } = lock(&self.state).begin_fetch()?;
        tracing::debug!(cursor = ?cursor, limit = self.limit, "fetching catalog page");

        let state: Weak<Mutex<CatalogState>> = Arc::downgrade(&self.state);
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);
        let limit = self.limit;

        Some(tokio::spawn(async move {
            let result = source.list_products(cursor, limit).await;

            let Some(state) = state.upgrade() else {
                tracing::debug!(cursor = ?cursor, "catalog client dropped, discarding page");
                return;
            };

            match result {
                Ok(page) => {
                    let added = lock(&state).apply_page(page);
                    tracing::debug!(added, "catalog page appended");
                }
                Err(e) => {
                    lock(&state).abort_fetch();
                    tracing::warn!(error = %e, cursor = ?cursor, "catalog page fetch failed");
                    notifier.notify(Notice::error(e.user_message()));
                }
            }
        }))
    }

    /// Fetch pages until the catalog is exhausted. Returns the number of
    /// products added.
    ///
    /// Returns early (without error) if a fetch started by
    /// [`Self::on_last_item_visible`] is still running.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error; pages fetched before it are kept.
    pub async fn load_all(&self) -> Result<usize, ClientError> {
        let mut total = 0;
        loop {
            let Some(FetchTicket { cursor }) = lock(&self.state).begin_fetch() else {
                return Ok(total);
            };

            match self.source.list_products(cursor, self.limit).await {
                Ok(page) => total += lock(&self.state).apply_page(page),
                Err(e) => {
                    lock(&self.state).abort_fetch();
                    return Err(e);
                }
            }
        }
    }

    /// Snapshot of every product loaded so far, newest first.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        lock(&self.state).products.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.state).products.is_empty()
    }

    /// Whether another page may exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        lock(&self.state).has_more
    }

    /// Whether a page fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        lock(&self.state).in_flight
    }

    /// Id of the last product of the most recent non-empty page.
    #[must_use]
    pub fn cursor(&self) -> Option<ProductId> {
        lock(&self.state).cursor
    }

    /// A loaded product by id.
    #[must_use]
    pub fn resolve(&self, id: ProductId) -> Option<Product> {
        lock(&self.state)
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Loaded products carrying at least one of `selected`. An empty
    /// selection means no filter.
    #[must_use]
    pub fn filter_by_tags(&self, selected: &HashSet<TagId>) -> Vec<Product> {
        let state = lock(&self.state);
        if selected.is_empty() {
            return state.products.clone();
        }
        state
            .products
            .iter()
            .filter(|p| p.has_any_tag(selected))
            .cloned()
            .collect()
    }
}

impl<S: ProductSource> PriceLookup for CatalogClient<S> {
    fn price_of(&self, id: ProductId) -> Option<Decimal> {
        lock(&self.state)
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.price)
    }
}
