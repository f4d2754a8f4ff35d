//! Order repository.
//!
//! Saving an order and emptying the owner's cart document happen together:
//! in one transaction on Postgres, under the users write lock in memory.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use threadline_core::{
    Order, OrderId, OrderLine, OrderStatus, PaymentMethod, ShippingAddress, UserId,
};

use super::{Database, RepositoryError};

/// Input for placing an order; lines are already priced.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub name: String,
    pub phone: String,
    pub items: Vec<OrderLine>,
    pub amount: Decimal,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    name: String,
    phone: String,
    items: Json<Vec<OrderLine>>,
    amount: Decimal,
    address: Json<ShippingAddress>,
    status: OrderStatus,
    payment_method: PaymentMethod,
    paid: bool,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            phone: row.phone,
            items: row.items.0,
            amount: row.amount,
            address: row.address.0,
            status: row.status,
            payment_method: row.payment_method,
            paid: row.paid,
            date: row.created_at,
        }
    }
}

/// Repository for placed orders.
pub struct OrderRepository<'a> {
    db: &'a Database,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Save an order for `owner` and empty the owner's cart document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner does not exist; nothing
    /// is written in that case.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn place(&self, owner: UserId, new: &NewOrder) -> Result<Order, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let mut users = store.users.write().await;
                let user = users.get_mut(&owner).ok_or(RepositoryError::NotFound)?;

                let order = Order {
                    id: store.next_order_id(),
                    user_id: owner,
                    name: new.name.clone(),
                    phone: new.phone.clone(),
                    items: new.items.clone(),
                    amount: new.amount,
                    address: new.address.clone(),
                    status: OrderStatus::Pending,
                    payment_method: new.payment_method,
                    paid: false,
                    date: Utc::now(),
                };
                store.orders.write().await.insert(order.id, order.clone());
                user.cart_data.clear();
                Ok(order)
            }
            Database::Postgres(pool) => {
                let mut tx = pool.begin().await?;

                let cleared = sqlx::query(
                    "UPDATE shop.user SET cart_data = '[]'::jsonb, updated_at = now() WHERE id = $1",
                )
                .bind(owner)
                .execute(&mut *tx)
                .await?;
                if cleared.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }

                let row: OrderRow = sqlx::query_as(
                    r"
                    INSERT INTO shop.order (user_id, name, phone, items, amount, address, payment_method)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id, user_id, name, phone, items, amount, address,
                              status, payment_method, paid, created_at
                    ",
                )
                .bind(owner)
                .bind(&new.name)
                .bind(&new.phone)
                .bind(Json(&new.items))
                .bind(new.amount)
                .bind(Json(&new.address))
                .bind(new.payment_method)
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(row.into())
            }
        }
    }

    /// Every order placed by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, owner: UserId) -> Result<Vec<Order>, RepositoryError> {
        match self.db {
            Database::Memory(store) => Ok(store
                .orders
                .read()
                .await
                .values()
                .rev()
                .filter(|order| order.user_id == owner)
                .cloned()
                .collect()),
            Database::Postgres(pool) => {
                let rows: Vec<OrderRow> = sqlx::query_as(
                    r"
                    SELECT id, user_id, name, phone, items, amount, address,
                           status, payment_method, paid, created_at
                    FROM shop.order
                    WHERE user_id = $1
                    ORDER BY id DESC
                    ",
                )
                .bind(owner)
                .fetch_all(pool)
                .await?;
                Ok(rows.into_iter().map(Order::from).collect())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use threadline_core::{CartLine, Email, ProductId};

    use super::*;
    use crate::db::{CartRepository, UserRepository};

    fn new_order(items: usize) -> NewOrder {
        NewOrder {
            name: "Ada".to_string(),
            phone: "0900000000".to_string(),
            items: (1..=items)
                .map(|i| OrderLine {
                    product_id: ProductId::new(i64::try_from(i).unwrap()),
                    name: format!("Product {i}"),
                    size: String::new(),
                    color: String::new(),
                    quantity: 1,
                    price: Decimal::from(10),
                })
                .collect(),
            amount: Decimal::from(15),
            address: ShippingAddress {
                street: "1 Mill Lane".to_string(),
                ward: "Riverside".to_string(),
                city: "Hanoi".to_string(),
            },
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[tokio::test]
    async fn test_memory_place_clears_cart_and_lists_newest_first() {
        let db = Database::memory();
        let owner = UserRepository::new(&db)
            .create(&Email::parse("ada@example.com").unwrap(), "hash")
            .await
            .unwrap()
            .id;
        let carts = CartRepository::new(&db);
        carts
            .save(
                owner,
                &[CartLine {
                    product_id: ProductId::new(1),
                    size: String::new(),
                    color: String::new(),
                    quantity: 1,
                }],
            )
            .await
            .unwrap();

        let repo = OrderRepository::new(&db);
        let first = repo.place(owner, &new_order(1)).await.unwrap();
        let second = repo.place(owner, &new_order(2)).await.unwrap();

        assert_eq!(first.status, OrderStatus::Pending);
        assert!(!first.paid);
        assert_eq!(carts.load(owner).await.unwrap(), Some(vec![]));

        let ids: Vec<OrderId> = repo
            .list_for(owner)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(repo.list_for(UserId::new(99)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_place_for_unknown_owner_writes_nothing() {
        let db = Database::memory();
        let repo = OrderRepository::new(&db);

        assert!(matches!(
            repo.place(UserId::new(404), &new_order(1)).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(repo.list_for(UserId::new(404)).await.unwrap().is_empty());
    }
}
