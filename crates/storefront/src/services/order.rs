//! Order placement.
//!
//! An order is placed from the cart lines the shopper submits. Every line's
//! product must still exist; its current name and price are copied into the
//! order and the amount is computed here, never taken from the request. A
//! placed order empties the owner's cart document.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use threadline_core::{
    Order, OrderLine, PaymentMethod, PlaceOrderBody, ProductId, Quantity, UserId, order_amount,
};

use crate::db::{Database, NewOrder, OrderRepository, ProductRepository, RepositoryError};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request is missing contact details, an address field, or items.
    #[error("{0}")]
    Validation(String),

    /// An ordered product no longer exists.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The order owner does not exist.
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Places and lists orders for one owner at a time.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    delivery_fee: Decimal,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, delivery_fee: Decimal) -> Self {
        Self {
            orders: OrderRepository::new(db),
            products: ProductRepository::new(db),
            delivery_fee,
        }
    }

    /// Price the submitted lines, save the order, and empty the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` or `OrderError::ProductNotFound`
    /// without writing anything. Returns `OrderError::UserNotFound` if the
    /// owner does not exist, or `OrderError::Repository` on storage failure.
    #[instrument(skip(self, body), fields(lines = body.items.len()))]
    pub async fn place(&self, owner: UserId, body: &PlaceOrderBody) -> Result<Order, OrderError> {
        validate(body)?;

        let mut items = Vec::with_capacity(body.items.len());
        for line in &body.items {
            let product = self
                .products
                .get(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            items.push(OrderLine {
                product_id: product.id,
                name: product.name,
                size: line.size.clone(),
                color: line.color.clone(),
                quantity: line.quantity,
                price: product.price,
            });
        }

        let new = NewOrder {
            name: body.name.trim().to_owned(),
            phone: body.phone.trim().to_owned(),
            amount: order_amount(&items, self.delivery_fee),
            items,
            address: body.address.clone(),
            payment_method: PaymentMethod::CashOnDelivery,
        };

        let order = self.orders.place(owner, &new).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::UserNotFound,
            other => OrderError::Repository(other),
        })?;

        tracing::info!(order_id = %order.id, amount = %order.amount, "order placed");
        Ok(order)
    }

    /// The owner's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on storage failure.
    pub async fn list_for(&self, owner: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for(owner).await?)
    }
}

fn validate(body: &PlaceOrderBody) -> Result<(), OrderError> {
    if body.name.trim().is_empty() {
        return Err(OrderError::Validation("'name' is required".to_owned()));
    }
    if body.phone.trim().is_empty() {
        return Err(OrderError::Validation("'phone' is required".to_owned()));
    }
    if let Some(field) = body.address.missing_field() {
        return Err(OrderError::Validation(format!("'address.{field}' is required")));
    }
    if body.items.is_empty() {
        return Err(OrderError::Validation("cannot order an empty cart".to_owned()));
    }
    if let Some(line) = body
        .items
        .iter()
        .find(|line| line.quantity == 0 || line.quantity > Quantity::MAX)
    {
        return Err(OrderError::Validation(format!(
            "quantity of product {} must be between 1 and {}",
            line.product_id,
            Quantity::MAX
        )));
    }
    Ok(())
}
