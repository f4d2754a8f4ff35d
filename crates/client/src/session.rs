//! One shopper's session.
//!
//! Owns the [`CartLedger`]. Logging in replaces the local cart with the
//! server's copy and starts replicating; logging out stops replicating and
//! empties the cart. Anonymous sessions keep a purely local cart. A placed
//! order empties the cart on both sides.

use std::sync::Arc;

use threadline_core::{Order, PlaceOrderBody, ShippingAddress};

use crate::api::{AccountApi, ApiClient, CartRemote, OrderApi};
use crate::error::ClientError;
use crate::ledger::CartLedger;
use crate::notify::{Notice, Notifier};

pub struct ShopSession<A = ApiClient> {
    api: A,
    ledger: CartLedger<A>,
    notifier: Arc<dyn Notifier>,
    logged_in: bool,
}

impl<A> ShopSession<A>
where
    A: AccountApi + CartRemote + OrderApi + Clone,
{
    /// An anonymous session with an empty cart.
    #[must_use]
    pub fn new(api: A, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger: CartLedger::new(Arc::clone(&notifier)),
            api,
            notifier,
            logged_in: false,
        }
    }

    /// Authenticate, hydrate the cart from the server and start replicating.
    ///
    /// If the cart cannot be fetched the login still succeeds: a notice is
    /// emitted and the local cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the login error (also emitted as a notice); the session stays
    /// anonymous.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let ack = match self.api.login(email, password).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.notifier.notify(Notice::error(e.user_message()));
                return Err(e);
            }
        };
        self.logged_in = true;

        match self.api.fetch_cart().await {
            Ok(lines) => self.ledger.hydrate(lines),
            Err(e) => {
                tracing::warn!(error = %e, "cart hydrate failed");
                self.notifier.notify(Notice::error(e.user_message()));
            }
        }

        self.ledger.attach_remote(self.api.clone());
        self.notifier.notify(Notice::success(ack.message));
        Ok(())
    }

    /// End the server session and empty the local cart.
    ///
    /// A failed server logout is reported as a notice; local state is cleared
    /// regardless.
    pub async fn logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout failed");
            self.notifier.notify(Notice::error(e.user_message()));
        }
        self.ledger.detach_remote();
        self.ledger.clear();
        self.logged_in = false;
    }

    /// Order everything in the cart, cash on delivery.
    ///
    /// The local lines are submitted as they are; the server prices them and
    /// empties its stored cart. The ledger is cleared only once the order is
    /// accepted. Replications still in flight when the order is placed may
    /// land after the server cleared the cart and reappear on the next login.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection (also emitted as a notice), e.g. 401
    /// for an anonymous session or 404 for a product that no longer exists.
    /// The ledger is left untouched.
    pub async fn place_order(
        &mut self,
        name: &str,
        phone: &str,
        address: ShippingAddress,
    ) -> Result<Order, ClientError> {
        let body = PlaceOrderBody {
            name: name.to_owned(),
            phone: phone.to_owned(),
            address,
            items: self.ledger.lines().to_vec(),
        };

        match self.api.place_order(&body).await {
            Ok(placed) => {
                self.ledger.clear();
                tracing::info!(order_id = %placed.order.id, amount = %placed.order.amount, "order placed");
                self.notifier.notify(Notice::success(placed.message));
                Ok(placed.order)
            }
            Err(e) => {
                tracing::warn!(error = %e, lines = body.items.len(), "order rejected");
                self.notifier.notify(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    /// The account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns the API error, e.g. 401 when not logged in.
    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.api.orders().await
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    #[must_use]
    pub const fn ledger(&self) -> &CartLedger<A> {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut CartLedger<A> {
        &mut self.ledger
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }
}
