//! Process-local tables used when no database is configured.
//!
//! The tables mirror the Postgres schema closely enough for the repositories
//! to share semantics: ids come from monotonically increasing counters and a
//! user's cart is one document that is read and written whole.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use threadline_core::{CartLine, Email, Order, OrderId, ProductId, Tag, TagId, UserId};

/// Stored product row; tags are kept as ids and populated on read.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Vec<String>,
    pub tag_ids: Vec<TagId>,
    pub created_at: DateTime<Utc>,
}

/// Stored user row, cart document included.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub cart_data: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
}

/// In-memory tables.
#[derive(Debug)]
pub struct MemoryStore {
    pub(crate) products: RwLock<BTreeMap<ProductId, ProductRecord>>,
    pub(crate) tags: RwLock<HashMap<TagId, Tag>>,
    pub(crate) users: RwLock<HashMap<UserId, UserRecord>>,
    pub(crate) orders: RwLock<BTreeMap<OrderId, Order>>,
    next_product_id: AtomicI64,
    next_tag_id: AtomicI64,
    next_user_id: AtomicI64,
    next_order_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
            tags: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            orders: RwLock::new(BTreeMap::new()),
            next_product_id: AtomicI64::new(1),
            next_tag_id: AtomicI64::new(1),
            next_user_id: AtomicI64::new(1),
            next_order_id: AtomicI64::new(1),
        }
    }
}

impl MemoryStore {
    pub(crate) fn next_product_id(&self) -> ProductId {
        ProductId::new(self.next_product_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn next_tag_id(&self) -> TagId {
        TagId::new(self.next_tag_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn next_user_id(&self) -> UserId {
        UserId::new(self.next_user_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn next_order_id(&self) -> OrderId {
        OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }
}
