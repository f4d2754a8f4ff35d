//! Request and response envelopes of the JSON API.
//!
//! Every response carries `success`. Failures are always
//! [`MessageResponse`] with `success: false`.

use serde::{Deserialize, Serialize};

use super::cart::CartLine;
use super::id::ProductId;
use super::order::{Order, ShippingAddress};
use super::product::Product;

/// `GET /product/list` response: one keyset page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
    pub has_more: bool,
    /// Id of the last returned product; absent on an empty page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<ProductId>,
}

/// `GET /product/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

/// `GET /cart/get` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub success: bool,
    pub cart_data: Vec<CartLine>,
}

/// Generic acknowledgement or failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// `POST /cart/add` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub item_id: ProductId,
    pub size: String,
    pub color: String,
}

/// `PUT /cart/update` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartBody {
    pub item_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

/// `POST /order/place` body. `items` is the cart being ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceOrderBody {
    pub name: String,
    pub phone: String,
    pub address: ShippingAddress,
    pub items: Vec<CartLine>,
}

/// `POST /order/place` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

/// `GET /order/user` response, newest order first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

/// `POST /user/register` and `POST /user/login` body.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsBody")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
