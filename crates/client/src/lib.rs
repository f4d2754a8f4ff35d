//! Threadline shop client.
//!
//! - [`CartLedger`] - optimistic, client-held cart; mutations apply locally
//!   first and replicate to the server in the background
//! - [`CatalogClient`] - accumulates catalog pages one visibility signal at a
//!   time, with at most one fetch in flight
//! - [`ApiClient`] - `reqwest` client for the storefront JSON API
//! - [`ShopSession`] - one shopper's session: owns the ledger, hydrates it on
//!   login, and clears it on logout or after a placed order

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod session;

pub use api::{AccountApi, ApiClient, CartRemote, OrderApi, ProductSource};
pub use catalog::CatalogClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use ledger::{CartLedger, Replication};
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use session::ShopSession;
