//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login
//! - `catalog` - Keyset pagination over the product catalog
//! - `cart` - Per-owner cart mutations (read-modify-write of one document)
//! - `lookup` - Cached product existence/price lookups
//! - `order` - Order placement (prices the cart, then empties it)

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod lookup;
pub mod order;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartInput, CartService};
pub use catalog::{CatalogPage, CatalogService};
pub use lookup::ProductLookup;
pub use order::{OrderError, OrderService};
