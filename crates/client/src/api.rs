//! HTTP client for the storefront JSON API.
//!
//! The session cookie set by `/user/login` lives in the client's cookie
//! store, so one [`ApiClient`] (and its clones) is one shopper's session.

use std::future::Future;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use threadline_core::{
    AddToCartBody, CartKey, CartLine, CartResponse, CredentialsBody, MessageResponse, Order,
    OrderListResponse, OrderResponse, PlaceOrderBody, Product, ProductId, ProductListResponse,
    ProductResponse, UpdateCartBody,
};

use crate::error::ClientError;

/// Source of catalog pages.
pub trait ProductSource: Send + Sync + 'static {
    /// One keyset page: products with id below `cursor`, newest first.
    fn list_products(
        &self,
        cursor: Option<ProductId>,
        limit: u32,
    ) -> impl Future<Output = Result<ProductListResponse, ClientError>> + Send;
}

/// Server side of the cart, scoped to the current session.
pub trait CartRemote: Send + Sync + 'static {
    fn add_line(
        &self,
        key: &CartKey,
    ) -> impl Future<Output = Result<MessageResponse, ClientError>> + Send;

    fn set_line(
        &self,
        key: &CartKey,
        quantity: u32,
    ) -> impl Future<Output = Result<MessageResponse, ClientError>> + Send;

    fn fetch_cart(&self) -> impl Future<Output = Result<Vec<CartLine>, ClientError>> + Send;
}

/// Account operations that establish or end the server session.
pub trait AccountApi: Send + Sync + 'static {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<MessageResponse, ClientError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<MessageResponse, ClientError>> + Send;
}

/// Orders of the logged-in account.
pub trait OrderApi: Send + Sync + 'static {
    /// Order `body.items`; the server empties the stored cart on success.
    fn place_order(
        &self,
        body: &PlaceOrderBody,
    ) -> impl Future<Output = Result<OrderResponse, ClientError>> + Send;

    fn orders(&self) -> impl Future<Output = Result<Vec<Order>, ClientError>> + Send;
}

/// Client for the storefront JSON API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (e.g.
    /// `http://localhost:4000/api`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if `base_url` is not a valid URL.
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        // `Url::join` drops the last path segment unless it ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { http, base }),
        })
    }

    /// The API root, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.inner.base.join(path)?;
        Ok(self.inner.http.request(method, url))
    }

    /// Send a request and decode the success body, or turn a failure
    /// envelope into `ClientError::Api`.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<MessageResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |envelope| envelope.message,
            );
            tracing::debug!(status = %status, message = %message, "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ClientError::Decode(e)
        })
    }

    /// `POST /user/register`; also logs the new account in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 409 if the email is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<MessageResponse, ClientError> {
        let body = CredentialsBody {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.execute(self.request(Method::POST, "user/register")?.json(&body))
            .await
    }

    /// `GET /product/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        let response: ProductResponse = self
            .execute(self.request(Method::GET, &format!("product/{id}"))?)
            .await?;
        Ok(response.product)
    }
}

impl ProductSource for ApiClient {
    async fn list_products(
        &self,
        cursor: Option<ProductId>,
        limit: u32,
    ) -> Result<ProductListResponse, ClientError> {
        let mut url = self.inner.base.join("product/list")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = cursor {
                query.append_pair("lastId", &cursor.to_string());
            }
            query.append_pair("limit", &limit.to_string());
        }
        self.execute(self.inner.http.get(url)).await
    }
}

impl CartRemote for ApiClient {
    async fn add_line(&self, key: &CartKey) -> Result<MessageResponse, ClientError> {
        let body = AddToCartBody {
            item_id: key.product_id,
            size: key.size.clone(),
            color: key.color.clone(),
        };
        self.execute(self.request(Method::POST, "cart/add")?.json(&body))
            .await
    }

    async fn set_line(&self, key: &CartKey, quantity: u32) -> Result<MessageResponse, ClientError> {
        let body = UpdateCartBody {
            item_id: key.product_id,
            size: key.size.clone(),
            color: key.color.clone(),
            quantity,
        };
        self.execute(self.request(Method::PUT, "cart/update")?.json(&body))
            .await
    }

    async fn fetch_cart(&self) -> Result<Vec<CartLine>, ClientError> {
        let response: CartResponse = self.execute(self.request(Method::GET, "cart/get")?).await?;
        Ok(response.cart_data)
    }
}

impl AccountApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<MessageResponse, ClientError> {
        let body = CredentialsBody {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.execute(self.request(Method::POST, "user/login")?.json(&body))
            .await
    }

    async fn logout(&self) -> Result<MessageResponse, ClientError> {
        self.execute(self.request(Method::POST, "user/logout")?)
            .await
    }
}

impl OrderApi for ApiClient {
    async fn place_order(&self, body: &PlaceOrderBody) -> Result<OrderResponse, ClientError> {
        self.execute(self.request(Method::POST, "order/place")?.json(body))
            .await
    }

    async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        let response: OrderListResponse =
            self.execute(self.request(Method::GET, "order/user")?).await?;
        Ok(response.orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let client = ApiClient::new("http://localhost:4000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:4000/api/");
        assert_eq!(
            client.base_url().join("cart/get").unwrap().as_str(),
            "http://localhost:4000/api/cart/get"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
