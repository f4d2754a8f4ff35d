//! Cart route handlers.
//!
//! Every endpoint is scoped to the logged-in user. Mutations acknowledge
//! with a message only; clients reconcile by fetching the cart.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use threadline_core::{CartResponse, MessageResponse};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{CartInput, CartService};
use crate::state::AppState;

/// The caller's cart as stored.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart_data = CartService::new(state.db(), state.lookup())
        .fetch(user.id)
        .await?;

    Ok(Json(CartResponse {
        success: true,
        cart_data,
    }))
}

/// Add one unit of a product variant.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CartInput>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(input) = body?;
    let key = input.key()?;

    CartService::new(state.db(), state.lookup())
        .apply_add(user.id, &key)
        .await?;

    Ok(Json(MessageResponse::ok("Added to cart")))
}

/// Set the quantity of a product variant; zero removes the line.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CartInput>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(input) = body?;
    let key = input.key()?;
    let quantity = input.quantity()?;

    CartService::new(state.db(), state.lookup())
        .apply_set(user.id, &key, quantity)
        .await?;

    Ok(Json(MessageResponse::ok("Cart updated")))
}
