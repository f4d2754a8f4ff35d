//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod api;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod product;

pub use api::*;
pub use cart::{CartKey, CartLine, Quantity, QuantityError, add_one, set_quantity};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{
    Order, OrderLine, OrderStatus, PaymentMethod, ShippingAddress, order_amount,
};
pub use product::{PriceLookup, Product, Tag, TagRef};
