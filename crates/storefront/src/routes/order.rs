//! Order route handlers, scoped to the logged-in user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use threadline_core::{OrderListResponse, OrderResponse, PlaceOrderBody};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::OrderService;
use crate::state::AppState;

/// Place a cash-on-delivery order for the submitted cart lines and empty the
/// caller's stored cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<PlaceOrderBody>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let Json(body) = body?;

    let order = OrderService::new(state.db(), state.config().delivery_fee)
        .place(user.id, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            message: "Order placed, pay on delivery".to_string(),
            order,
        }),
    ))
}

/// The caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderService::new(state.db(), state.config().delivery_fee)
        .list_for(user.id)
        .await?;

    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}
