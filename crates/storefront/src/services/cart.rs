//! Cart sync service.
//!
//! Each mutation is a read-modify-write of the owner's whole cart document:
//! load, apply the list arithmetic from `threadline_core`, save. Nothing
//! serializes two mutations for the same owner, so concurrent requests can
//! read the same snapshot and the later save wins. Only "applied at least
//! once" holds for racing adds.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use threadline_core::{CartKey, CartLine, ProductId, Quantity, UserId, add_one, set_quantity};

use super::lookup::ProductLookup;
use crate::db::{CartRepository, Database, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request is missing key fields or carries a bad quantity.
    #[error("{0}")]
    Validation(String),

    /// The cart owner does not exist.
    #[error("user not found")]
    UserNotFound,

    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Untyped cart mutation body as received on the wire.
///
/// Fields are optional so that a missing field becomes a `Validation` error
/// with a useful message instead of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInput {
    #[serde(default)]
    pub item_id: Option<serde_json::Value>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
}

impl CartInput {
    /// The line key named by this input.
    ///
    /// `itemId` may be a JSON integer or a numeric string. `size` and `color`
    /// must be present but may be empty.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` naming the first bad field.
    pub fn key(&self) -> Result<CartKey, CartError> {
        let product_id = self
            .item_id
            .as_ref()
            .and_then(parse_item_id)
            .ok_or_else(|| CartError::Validation("'itemId' is missing or invalid".to_owned()))?;
        let size = self
            .size
            .clone()
            .ok_or_else(|| CartError::Validation("'size' is required".to_owned()))?;
        let color = self
            .color
            .clone()
            .ok_or_else(|| CartError::Validation("'color' is required".to_owned()))?;

        Ok(CartKey::new(product_id, size, color))
    }

    /// The requested quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if absent or not an integer in range.
    pub fn quantity(&self) -> Result<Quantity, CartError> {
        let raw = self
            .quantity
            .as_ref()
            .ok_or_else(|| CartError::Validation("'quantity' is required".to_owned()))?;
        Quantity::from_json(raw).map_err(|e| CartError::Validation(format!("'quantity': {e}")))
    }
}

fn parse_item_id(value: &serde_json::Value) -> Option<ProductId> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(ProductId::new),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .filter(|id| id.as_i64() > 0)
}

/// Per-owner cart mutations.
pub struct CartService<'a> {
    db: &'a Database,
    carts: CartRepository<'a>,
    lookup: &'a ProductLookup,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, lookup: &'a ProductLookup) -> Self {
        Self {
            db,
            carts: CartRepository::new(db),
            lookup,
        }
    }

    /// Increment the line for `key`, appending it with quantity 1 if absent.
    /// Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` or `CartError::UserNotFound`
    /// without writing anything, or `CartError::Repository` on storage failure.
    #[instrument(skip(self, key), fields(product_id = %key.product_id))]
    pub async fn apply_add(&self, owner: UserId, key: &CartKey) -> Result<u32, CartError> {
        self.ensure_product(key.product_id).await?;

        let mut lines = self.load_existing(owner).await?;
        let quantity = add_one(&mut lines, key);
        self.persist(owner, &lines).await?;

        tracing::debug!(size = %key.size, color = %key.color, quantity, "cart line added");
        Ok(quantity)
    }

    /// Set the line for `key` to `quantity`; zero removes it.
    ///
    /// Removing a line is allowed even if its product has since been deleted.
    ///
    /// # Errors
    ///
    /// Same as [`CartService::apply_add`].
    #[instrument(skip(self, key), fields(product_id = %key.product_id))]
    pub async fn apply_set(
        &self,
        owner: UserId,
        key: &CartKey,
        quantity: Quantity,
    ) -> Result<u32, CartError> {
        if !quantity.is_zero() {
            self.ensure_product(key.product_id).await?;
        }

        let mut lines = self.load_existing(owner).await?;
        let quantity = set_quantity(&mut lines, key, quantity);
        self.persist(owner, &lines).await?;

        tracing::debug!(size = %key.size, color = %key.color, quantity, "cart line set");
        Ok(quantity)
    }

    /// The owner's cart as stored, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` if the owner does not exist.
    pub async fn fetch(&self, owner: UserId) -> Result<Vec<CartLine>, CartError> {
        self.load_existing(owner).await
    }

    async fn ensure_product(&self, id: ProductId) -> Result<(), CartError> {
        if self.lookup.exists(self.db, id).await? {
            Ok(())
        } else {
            Err(CartError::ProductNotFound(id))
        }
    }

    async fn load_existing(&self, owner: UserId) -> Result<Vec<CartLine>, CartError> {
        self.carts.load(owner).await?.ok_or(CartError::UserNotFound)
    }

    async fn persist(&self, owner: UserId, lines: &[CartLine]) -> Result<(), CartError> {
        self.carts.save(owner, lines).await.map_err(|e| match e {
            RepositoryError::NotFound => CartError::UserNotFound,
            other => CartError::Repository(other),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::{NewProduct, ProductRepository, UserRepository};
    use threadline_core::Email;

    struct Fixture {
        db: Database,
        lookup: ProductLookup,
        owner: UserId,
        product: ProductId,
    }

    async fn fixture() -> Fixture {
        let db = Database::memory();
        let user = UserRepository::new(&db)
            .create(&Email::parse("shopper@example.com").unwrap(), "hash")
            .await
            .unwrap();
        let product = ProductRepository::new(&db)
            .create(&NewProduct {
                name: "Linen shirt".to_string(),
                description: String::new(),
                price: Decimal::from(10),
                image: vec![],
                tag_ids: vec![],
            })
            .await
            .unwrap();
        Fixture {
            db,
            lookup: ProductLookup::new(),
            owner: user.id,
            product: product.id,
        }
    }

    #[tokio::test]
    async fn test_repeated_add_counts_up() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let key = CartKey::new(f.product, "M", "red");

        for expected in 1..=4 {
            assert_eq!(service.apply_add(f.owner, &key).await.unwrap(), expected);
        }

        let lines = service.fetch(f.owner).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_set_zero_removes_and_preserves_order() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let small = CartKey::new(f.product, "S", "");
        let medium = CartKey::new(f.product, "M", "");
        let large = CartKey::new(f.product, "L", "");

        for key in [&small, &medium, &large] {
            service.apply_add(f.owner, key).await.unwrap();
        }
        service
            .apply_set(f.owner, &medium, Quantity::ZERO)
            .await
            .unwrap();
        service
            .apply_set(f.owner, &large, Quantity::new(3).unwrap())
            .await
            .unwrap();

        let lines = service.fetch(f.owner).await.unwrap();
        let summary: Vec<(&str, u32)> = lines
            .iter()
            .map(|l| (l.size.as_str(), l.quantity))
            .collect();
        assert_eq!(summary, vec![("S", 1), ("L", 3)]);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected_without_write() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let key = CartKey::new(ProductId::new(999), "M", "red");

        let result = service.apply_add(f.owner, &key).await;
        assert!(matches!(result, Err(CartError::ProductNotFound(_))));
        assert!(service.fetch(f.owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_removing_deleted_product_is_allowed() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let key = CartKey::new(f.product, "M", "red");
        service.apply_add(f.owner, &key).await.unwrap();

        ProductRepository::new(&f.db).delete(f.product).await.unwrap();
        f.lookup.invalidate(f.product).await;

        assert!(matches!(
            service
                .apply_set(f.owner, &key, Quantity::new(2).unwrap())
                .await,
            Err(CartError::ProductNotFound(_))
        ));
        assert_eq!(
            service
                .apply_set(f.owner, &key, Quantity::ZERO)
                .await
                .unwrap(),
            0
        );
        assert!(service.fetch(f.owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_owner() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let key = CartKey::new(f.product, "", "");

        assert!(matches!(
            service.apply_add(UserId::new(404), &key).await,
            Err(CartError::UserNotFound)
        ));
        assert!(matches!(
            service.fetch(UserId::new(404)).await,
            Err(CartError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_adds_apply_at_least_once() {
        let f = fixture().await;
        let service = CartService::new(&f.db, &f.lookup);
        let key = CartKey::new(f.product, "M", "red");

        // Warm the lookup cache, then empty the cart again.
        service
            .apply_set(f.owner, &key, Quantity::new(1).unwrap())
            .await
            .unwrap();
        service.apply_set(f.owner, &key, Quantity::ZERO).await.unwrap();
        assert!(service.fetch(f.owner).await.unwrap().is_empty());

        let (a, b) = tokio::join!(
            service.apply_add(f.owner, &key),
            service.apply_add(f.owner, &key)
        );
        a.unwrap();
        b.unwrap();

        let lines = service.fetch(f.owner).await.unwrap();
        assert_eq!(lines.len(), 1);
        // 1 is the lost update: both read the empty snapshot.
        assert!((1..=2).contains(&lines[0].quantity));
    }

    #[test]
    fn test_input_key_validation() {
        let input: CartInput =
            serde_json::from_value(json!({"itemId": 7, "size": "M", "color": ""})).unwrap();
        assert_eq!(input.key().unwrap(), CartKey::new(ProductId::new(7), "M", ""));

        let input: CartInput =
            serde_json::from_value(json!({"itemId": "7", "size": "", "color": "red"})).unwrap();
        assert_eq!(input.key().unwrap().product_id, ProductId::new(7));

        for body in [
            json!({"size": "M", "color": "red"}),
            json!({"itemId": "abc", "size": "M", "color": "red"}),
            json!({"itemId": 7, "color": "red"}),
            json!({"itemId": 7, "size": "M"}),
        ] {
            let input: CartInput = serde_json::from_value(body).unwrap();
            assert!(matches!(input.key(), Err(CartError::Validation(_))));
        }
    }

    #[test]
    fn test_input_quantity_validation() {
        let quantity = |v: serde_json::Value| CartInput {
            quantity: Some(v),
            ..CartInput::default()
        };

        assert_eq!(quantity(json!(3)).quantity().unwrap().get(), 3);
        assert!(quantity(json!(0)).quantity().unwrap().is_zero());
        for bad in [json!(-1), json!(1.5), json!("2"), json!(null)] {
            assert!(matches!(
                quantity(bad).quantity(),
                Err(CartError::Validation(_))
            ));
        }
        assert!(matches!(
            CartInput::default().quantity(),
            Err(CartError::Validation(_))
        ));
    }
}
