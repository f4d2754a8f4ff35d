//! Optimistic, client-held cart.
//!
//! Every mutation applies to the local lines immediately and unconditionally,
//! so an anonymous shopper has a working cart. When a remote is attached the
//! same mutation is then replayed against the server in a background task.
//! Replication is best effort: a failure is reported through the notifier and
//! never rolls back local state, so local and server carts can diverge until
//! the next [`CartLedger::hydrate`].

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use threadline_core::{CartKey, CartLine, PriceLookup, ProductId, Quantity, add_one, set_quantity};

use crate::api::CartRemote;
use crate::notify::{Notice, Notifier};

/// Handle to a background replication.
///
/// Dropping it lets the replication finish on its own.
#[derive(Debug)]
pub struct Replication(Option<JoinHandle<()>>);

impl Replication {
    const fn local_only() -> Self {
        Self(None)
    }

    /// Whether no server mutation was issued (no remote attached).
    #[must_use]
    pub const fn is_local_only(&self) -> bool {
        self.0.is_none()
    }

    /// Wait until the server mutation has completed, successfully or not.
    pub async fn settled(self) {
        if let Some(handle) = self.0
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "cart replication task failed");
        }
    }
}

/// The shopper's cart lines plus an optional server replica.
pub struct CartLedger<R> {
    lines: Vec<CartLine>,
    remote: Option<R>,
    notifier: Arc<dyn Notifier>,
}

impl<R> CartLedger<R>
where
    R: CartRemote + Clone,
{
    /// An empty, local-only cart.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lines: Vec::new(),
            remote: None,
            notifier,
        }
    }

    /// Start replicating mutations to `remote`.
    pub fn attach_remote(&mut self, remote: R) {
        self.remote = Some(remote);
    }

    /// Stop replicating; returns the remote that was attached.
    pub fn detach_remote(&mut self) -> Option<R> {
        self.remote.take()
    }

    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity of the line for `key`, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, key: &CartKey) -> u32 {
        self.lines
            .iter()
            .find(|line| line.matches(key))
            .map_or(0, |line| line.quantity)
    }

    /// Total number of units, for the cart badge.
    #[must_use]
    pub fn line_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Add one unit of a variant.
    ///
    /// Must be called within a Tokio runtime when a remote is attached.
    pub fn add_line(
        &mut self,
        product_id: ProductId,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Replication {
        let key = CartKey::new(product_id, size, color);
        let quantity = add_one(&mut self.lines, &key);
        tracing::debug!(product_id = %key.product_id, quantity, "cart line added locally");

        let Some(remote) = self.remote.clone() else {
            return Replication::local_only();
        };
        let notifier = Arc::clone(&self.notifier);

        Replication(Some(tokio::spawn(async move {
            match remote.add_line(&key).await {
                Ok(ack) => notifier.notify(Notice::success(ack.message)),
                Err(e) => {
                    tracing::warn!(error = %e, product_id = %key.product_id, "cart add not replicated");
                    notifier.notify(Notice::error(e.user_message()));
                }
            }
        })))
    }

    /// Set the quantity of a variant; zero removes the line.
    ///
    /// Must be called within a Tokio runtime when a remote is attached.
    pub fn set_line_quantity(
        &mut self,
        product_id: ProductId,
        size: impl Into<String>,
        color: impl Into<String>,
        quantity: Quantity,
    ) -> Replication {
        let key = CartKey::new(product_id, size, color);
        let quantity = set_quantity(&mut self.lines, &key, quantity);
        tracing::debug!(product_id = %key.product_id, quantity, "cart line set locally");

        let Some(remote) = self.remote.clone() else {
            return Replication::local_only();
        };
        let notifier = Arc::clone(&self.notifier);

        Replication(Some(tokio::spawn(async move {
            if let Err(e) = remote.set_line(&key, quantity).await {
                tracing::warn!(error = %e, product_id = %key.product_id, "cart update not replicated");
                notifier.notify(Notice::error(e.user_message()));
            }
        })))
    }

    /// Sum of `quantity * price` over all lines. Lines whose product cannot
    /// be resolved contribute zero.
    #[must_use]
    pub fn compute_total<L: PriceLookup + ?Sized>(&self, prices: &L) -> Decimal {
        self.lines
            .iter()
            .filter_map(|line| {
                prices
                    .price_of(line.product_id)
                    .map(|price| price * Decimal::from(line.quantity))
            })
            .sum()
    }

    /// Subtotal plus `delivery_fee`, or zero for a cart worth nothing.
    #[must_use]
    pub fn grand_total<L: PriceLookup + ?Sized>(&self, prices: &L, delivery_fee: Decimal) -> Decimal {
        let subtotal = self.compute_total(prices);
        if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            subtotal + delivery_fee
        }
    }

    /// Replace every line with the server's copy.
    pub fn hydrate(&mut self, lines: Vec<CartLine>) {
        tracing::debug!(lines = lines.len(), "cart hydrated");
        self.lines = lines;
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
