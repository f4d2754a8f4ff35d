//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use threadline_core::{Email, UserId};

/// A registered shopper.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID; also the owner id of the user's cart.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
