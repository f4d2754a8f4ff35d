//! Cart lines and the list arithmetic shared by the client ledger and the
//! server-side cart document.
//!
//! A cart is an ordered `Vec<CartLine>` with at most one line per
//! [`CartKey`]. Lines keep insertion order; nothing here re-sorts them.
//! A stored line never has quantity zero: writing zero removes the line.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Composite identity of a cart line: product plus selected variant options.
///
/// `size` and `color` may be empty strings (product without that option) but
/// are never absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl CartKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(product_id: ProductId, size: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            product_id,
            size: size.into(),
            color: color.into(),
        }
    }
}

/// One line of a cart as stored and as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl CartLine {
    /// Whether this line is identified by `key`.
    #[must_use]
    pub fn matches(&self, key: &CartKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// The composite key of this line.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey::new(self.product_id, self.size.clone(), self.color.clone())
    }

    fn from_key(key: &CartKey, quantity: u32) -> Self {
        Self {
            product_id: key.product_id,
            size: key.size.clone(),
            color: key.color.clone(),
            quantity,
        }
    }
}

/// Errors from validating a requested quantity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be a non-negative integer")]
    NotANonNegativeInteger,
    #[error("quantity must be at most {max}")]
    TooLarge { max: u32 },
}

/// A requested line quantity. Zero means "remove the line".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity accepted for a single line.
    pub const MAX: u32 = 9_999;

    /// Removal marker.
    pub const ZERO: Self = Self(0);

    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` above [`Quantity::MAX`].
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Validate an untyped JSON value: negative numbers, fractions, strings
    /// and the like are all rejected with the same error.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError` if the value is not an integer in `0..=MAX`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, QuantityError> {
        let raw = value
            .as_u64()
            .ok_or(QuantityError::NotANonNegativeInteger)?;
        let raw = u32::try_from(raw).map_err(|_| QuantityError::TooLarge { max: Self::MAX })?;
        Self::new(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Increment the line for `key` by one, appending a new line with quantity 1
/// if none exists. Returns the resulting quantity.
///
/// A line already at [`Quantity::MAX`] stays there, so adds can never build
/// a quantity that [`set_quantity`] would refuse.
pub fn add_one(lines: &mut Vec<CartLine>, key: &CartKey) -> u32 {
    if let Some(line) = lines.iter_mut().find(|line| line.matches(key)) {
        if line.quantity < Quantity::MAX {
            line.quantity += 1;
        }
        return line.quantity;
    }
    lines.push(CartLine::from_key(key, 1));
    1
}

/// Set the quantity of the line for `key`: zero removes it, anything else
/// updates it in place or appends it. Returns the resulting quantity.
pub fn set_quantity(lines: &mut Vec<CartLine>, key: &CartKey, quantity: Quantity) -> u32 {
    let position = lines.iter().position(|line| line.matches(key));

    if quantity.is_zero() {
        if let Some(index) = position {
            lines.remove(index);
        }
        return 0;
    }

    match position.and_then(|index| lines.get_mut(index)) {
        Some(line) => line.quantity = quantity.get(),
        None => lines.push(CartLine::from_key(key, quantity.get())),
    }
    quantity.get()
}
