//! Cart document repository.
//!
//! A user's cart is a single document (`shop.user.cart_data`) that is always
//! loaded whole and saved whole. There is no compare-and-swap and no per-line
//! atomic update: two writers that load the same snapshot both save, and the
//! later save wins. Callers that mutate carts inherit this "last write wins"
//! behavior.

use sqlx::types::Json;

use threadline_core::{CartLine, UserId};

use super::{Database, RepositoryError};

/// Repository for per-user cart documents.
pub struct CartRepository<'a> {
    db: &'a Database,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load the owner's cart as stored. `None` if the owner does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored document is not a cart.
    pub async fn load(&self, owner: UserId) -> Result<Option<Vec<CartLine>>, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let lines = store
                    .users
                    .read()
                    .await
                    .get(&owner)
                    .map(|user| user.cart_data.clone());
                // Stand-in for the database round trip between read and write.
                tokio::task::yield_now().await;
                Ok(lines)
            }
            Database::Postgres(pool) => {
                let row: Option<Option<serde_json::Value>> =
                    sqlx::query_scalar("SELECT cart_data FROM shop.user WHERE id = $1")
                        .bind(owner)
                        .fetch_optional(pool)
                        .await?;

                match row {
                    None => Ok(None),
                    // Accounts created before carts existed have no document.
                    Some(None) => Ok(Some(Vec::new())),
                    Some(Some(value)) => serde_json::from_value(value).map(Some).map_err(|e| {
                        RepositoryError::DataCorruption(format!(
                            "invalid cart_data for user {owner}: {e}"
                        ))
                    }),
                }
            }
        }
    }

    /// Replace the owner's whole cart document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, owner: UserId, lines: &[CartLine]) -> Result<(), RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                tokio::task::yield_now().await;
                let mut users = store.users.write().await;
                let user = users.get_mut(&owner).ok_or(RepositoryError::NotFound)?;
                user.cart_data = lines.to_vec();
                Ok(())
            }
            Database::Postgres(pool) => {
                let result = sqlx::query(
                    "UPDATE shop.user SET cart_data = $2, updated_at = now() WHERE id = $1",
                )
                .bind(owner)
                .bind(Json(lines))
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            }
        }
    }
}
