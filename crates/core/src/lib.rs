//! Threadline Core - Shared types library.
//!
//! This crate provides the types shared by every Threadline component:
//! - `storefront` - HTTP server (catalog pages, cart persistence, sessions)
//! - `client` - Optimistic cart ledger and incremental catalog consumer
//! - `cli` - Migrations, seeding, and catalog browsing
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Cart line arithmetic lives here so the client's
//! optimistic ledger and the server's persisted cart apply identical rules.
//!
//! # Modules
//!
//! - [`types`] - Ids, emails, cart lines, products, tag references, orders,
//!   API envelopes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
