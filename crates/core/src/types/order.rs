//! Orders placed from a cart.
//!
//! An order freezes the cart lines together with each product's name and
//! unit price at the moment of ordering. Later catalog changes never alter a
//! placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId, UserId};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// How the order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
}

/// Where the order ships to. `street`, `ward` and `city` are all required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub ward: String,
    #[serde(default)]
    pub city: String,
}

impl ShippingAddress {
    /// Name of the first blank field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("ward", &self.ward),
            ("city", &self.city),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// One ordered variant, priced when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub items: Vec<OrderLine>,
    /// Items plus delivery fee.
    pub amount: Decimal,
    pub address: ShippingAddress,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub paid: bool,
    pub date: DateTime<Utc>,
}

/// Amount charged for `items`: their sum plus `delivery_fee`, or zero when
/// the items are worth nothing.
#[must_use]
pub fn order_amount(items: &[OrderLine], delivery_fee: Decimal) -> Decimal {
    let subtotal: Decimal = items.iter().map(OrderLine::line_total).sum();
    if subtotal.is_zero() {
        Decimal::ZERO
    } else {
        subtotal + delivery_fee
    }
}
