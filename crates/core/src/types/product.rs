//! Catalog products and tag references.
//!
//! Tag references arrive in two shapes: a bare id, or a populated object with
//! an id (and usually a name). Every comparison goes through [`TagRef::id`],
//! never through the shape.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, TagId};

/// A populated tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(alias = "_id")]
    pub id: TagId,
    #[serde(default)]
    pub name: String,
}

/// A reference to a tag, either bare or populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagRef {
    Id(TagId),
    Populated(Tag),
}

impl TagRef {
    /// Canonical tag id regardless of shape.
    #[must_use]
    pub const fn id(&self) -> TagId {
        match self {
            Self::Id(id) => *id,
            Self::Populated(tag) => tag.id,
        }
    }

    /// Tag name when populated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated(tag) => Some(&tag.name),
        }
    }
}

impl From<Tag> for TagRef {
    fn from(tag: Tag) -> Self {
        Self::Populated(tag)
    }
}

/// A catalog product as listed to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Image URLs, first one is the cover.
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub date: DateTime<Utc>,
}

impl Product {
    /// Canonical ids of this product's tags.
    pub fn tag_ids(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags.iter().map(TagRef::id)
    }

    /// Whether the product carries at least one of `selected`.
    #[must_use]
    pub fn has_any_tag(&self, selected: &HashSet<TagId>) -> bool {
        self.tag_ids().any(|id| selected.contains(&id))
    }
}

/// Resolves a product's current unit price for cart arithmetic.
///
/// Returning `None` means the product is unknown to the caller (not loaded
/// yet, or deleted); cart totals treat such lines as contributing zero.
pub trait PriceLookup {
    fn price_of(&self, id: ProductId) -> Option<Decimal>;
}

impl PriceLookup for HashMap<ProductId, Decimal> {
    fn price_of(&self, id: ProductId) -> Option<Decimal> {
        self.get(&id).copied()
    }
}

impl PriceLookup for [Product] {
    fn price_of(&self, id: ProductId) -> Option<Decimal> {
        self.iter().find(|p| p.id == id).map(|p| p.price)
    }
}
