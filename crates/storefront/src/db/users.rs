//! User repository for database operations.

use chrono::{DateTime, Utc};

use threadline_core::{Email, UserId};

use super::memory::UserRecord;
use super::{Database, RepositoryError, map_unique_violation};
use crate::models::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok((
            User {
                id: UserId::new(self.id),
                email,
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new user with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        match self.db {
            Database::Memory(store) => {
                let mut users = store.users.write().await;
                if users.values().any(|u| &u.email == email) {
                    return Err(RepositoryError::Conflict("email already exists".to_owned()));
                }
                let record = UserRecord {
                    id: store.next_user_id(),
                    email: email.clone(),
                    password_hash: password_hash.to_owned(),
                    cart_data: Vec::new(),
                    created_at: Utc::now(),
                };
                let user = User {
                    id: record.id,
                    email: record.email.clone(),
                    created_at: record.created_at,
                };
                users.insert(record.id, record);
                Ok(user)
            }
            Database::Postgres(pool) => {
                let row: UserRow = sqlx::query_as(
                    r"
                    INSERT INTO shop.user (email, password_hash, cart_data)
                    VALUES ($1, $2, '[]'::jsonb)
                    RETURNING id, email, password_hash, created_at
                    ",
                )
                .bind(email.as_str())
                .bind(password_hash)
                .fetch_one(pool)
                .await
                .map_err(|e| map_unique_violation(e, "email"))?;

                row.into_user().map(|(user, _)| user)
            }
        }
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        match self.db {
            Database::Memory(store) => Ok(store
                .users
                .read()
                .await
                .values()
                .find(|u| &u.email == email)
                .map(|u| {
                    (
                        User {
                            id: u.id,
                            email: u.email.clone(),
                            created_at: u.created_at,
                        },
                        u.password_hash.clone(),
                    )
                })),
            Database::Postgres(pool) => {
                let row: Option<UserRow> = sqlx::query_as(
                    "SELECT id, email, password_hash, created_at FROM shop.user WHERE email = $1",
                )
                .bind(email.as_str())
                .fetch_optional(pool)
                .await?;

                row.map(UserRow::into_user).transpose()
            }
        }
    }

    /// Delete a user and, with them, their cart document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let removed = match self.db {
            Database::Memory(store) => store.users.write().await.remove(&id).is_some(),
            Database::Postgres(pool) => {
                sqlx::query("DELETE FROM shop.user WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
                    > 0
            }
        };

        if removed {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
