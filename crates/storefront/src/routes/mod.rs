//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! All routes below are nested under `/api`.
//!
//! ```text
//! # Catalog
//! GET  /product/list?lastId=&limit= - Keyset page, newest first
//! GET  /product/{id}                - Single product
//!
//! # Cart (requires auth)
//! GET  /cart/get                    - Caller's cart
//! POST /cart/add                    - Add one unit of a variant
//! PUT  /cart/update                 - Set a variant's quantity (0 removes)
//!
//! # Orders (requires auth)
//! POST /order/place                 - Order the submitted lines, empty the cart
//! GET  /order/user                  - Caller's orders, newest first
//!
//! # Account
//! POST /user/register               - Create account and log in
//! POST /user/login                  - Log in
//! POST /user/logout                 - Log out
//! ```

pub mod auth;
pub mod cart;
pub mod order;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(products::list))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(cart::get))
        .route("/add", post(cart::add))
        .route("/update", put(cart::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/place", post(order::place))
        .route("/user", get(order::list))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/product", product_routes())
        .nest("/cart", cart_routes())
        .nest("/order", order_routes())
        .nest("/user", user_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{
        Router,
        body::{self, Body},
        http::{Request, StatusCode, header},
    };
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::StorefrontConfig;
    use crate::db::{Database, NewProduct, ProductRepository};
    use crate::state::AppState;

    async fn test_app(products: usize) -> Router {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);
        for i in 0..products {
            repo.create(&NewProduct {
                name: format!("Product {i}"),
                description: String::new(),
                price: Decimal::from(10),
                image: vec![format!("https://img.example.com/{i}.jpg")],
                tag_ids: vec![],
            })
            .await
            .unwrap();
        }
        crate::app(AppState::new(StorefrontConfig::default(), db))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, cookie, json)
    }

    async fn register(app: &Router) -> String {
        let (status, cookie, body) = send(
            app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({"email": "shopper@example.com", "password": "correct horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        cookie.unwrap()
    }

    #[tokio::test]
    async fn test_product_list_pages_with_cursor() {
        let app = test_app(25).await;

        let (status, _, first) = send(&app, "GET", "/api/product/list?limit=10", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["products"].as_array().unwrap().len(), 10);
        assert_eq!(first["products"][0]["id"], 25);
        assert_eq!(first["hasMore"], true);
        assert_eq!(first["nextCursor"], 16);

        let (_, _, last) = send(&app, "GET", "/api/product/list?lastId=6", None, None).await;
        assert_eq!(last["products"].as_array().unwrap().len(), 5);
        assert_eq!(last["hasMore"], false);
        assert_eq!(last["nextCursor"], 1);
    }

    #[tokio::test]
    async fn test_product_list_limit_fallbacks() {
        let app = test_app(15).await;

        for uri in [
            "/api/product/list",
            "/api/product/list?limit=0",
            "/api/product/list?limit=lots",
        ] {
            let (status, _, page) = send(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(page["products"].as_array().unwrap().len(), 10, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_product_list_rejects_malformed_cursor() {
        let app = test_app(3).await;
        let (status, _, body) =
            send(&app, "GET", "/api/product/list?lastId=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_empty_catalog_has_no_cursor() {
        let app = test_app(0).await;
        let (_, _, page) = send(&app, "GET", "/api/product/list", None, None).await;
        assert_eq!(page["products"], json!([]));
        assert_eq!(page["hasMore"], false);
        assert!(page.get("nextCursor").is_none());
    }

    #[tokio::test]
    async fn test_product_show() {
        let app = test_app(2).await;
        let (status, _, body) = send(&app, "GET", "/api/product/2", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product"]["name"], "Product 1");

        let (status, _, body) = send(&app, "GET", "/api/product/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cart_requires_session() {
        let app = test_app(1).await;

        let (status, _, body) = send(&app, "GET", "/api/cart/get", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _, _) = send(
            &app,
            "POST",
            "/api/cart/add",
            None,
            Some(json!({"itemId": 1, "size": "M", "color": "red"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cart_round_trip_for_logged_in_user() {
        let app = test_app(2).await;
        let cookie = register(&app).await;
        let cookie = Some(cookie.as_str());

        for _ in 0..2 {
            let (status, _, body) = send(
                &app,
                "POST",
                "/api/cart/add",
                cookie,
                Some(json!({"itemId": 1, "size": "M", "color": "red"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }
        send(
            &app,
            "PUT",
            "/api/cart/update",
            cookie,
            Some(json!({"itemId": 2, "size": "", "color": "", "quantity": 3})),
        )
        .await;

        let (status, _, cart) = send(&app, "GET", "/api/cart/get", cookie, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            cart["cartData"],
            json!([
                {"productId": 1, "size": "M", "color": "red", "quantity": 2},
                {"productId": 2, "size": "", "color": "", "quantity": 3}
            ])
        );
    }

    #[tokio::test]
    async fn test_cart_validation_errors() {
        let app = test_app(1).await;
        let cookie = register(&app).await;
        let cookie = Some(cookie.as_str());

        let bad_bodies = [
            ("POST", "/api/cart/add", json!({"itemId": 1, "color": "red"})),
            ("POST", "/api/cart/add", json!({"size": "M", "color": "red"})),
            (
                "PUT",
                "/api/cart/update",
                json!({"itemId": 1, "size": "M", "color": "red", "quantity": -1}),
            ),
            (
                "PUT",
                "/api/cart/update",
                json!({"itemId": 1, "size": "M", "color": "red", "quantity": 1.5}),
            ),
        ];
        for (method, uri, body) in bad_bodies {
            let (status, _, response) = send(&app, method, uri, cookie, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{response}");
            assert_eq!(response["success"], false);
        }

        let (status, _, _) = send(
            &app,
            "POST",
            "/api/cart/add",
            cookie,
            Some(json!({"itemId": 42, "size": "M", "color": "red"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, cart) = send(&app, "GET", "/api/cart/get", cookie, None).await;
        assert_eq!(cart["cartData"], json!([]));
    }

    #[tokio::test]
    async fn test_order_empties_stored_cart() {
        let app = test_app(2).await;
        let cookie = register(&app).await;
        let cookie = Some(cookie.as_str());

        for item_id in [1, 1, 2] {
            send(
                &app,
                "POST",
                "/api/cart/add",
                cookie,
                Some(json!({"itemId": item_id, "size": "M", "color": "red"})),
            )
            .await;
        }
        let (_, _, cart) = send(&app, "GET", "/api/cart/get", cookie, None).await;

        let (status, _, placed) = send(
            &app,
            "POST",
            "/api/order/place",
            cookie,
            Some(json!({
                "name": "Ada",
                "phone": "0900000000",
                "address": {"street": "1 Mill Lane", "ward": "Riverside", "city": "Hanoi"},
                "items": cart["cartData"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{placed}");
        assert_eq!(placed["success"], true);
        assert_eq!(placed["order"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(placed["order"]["status"], "pending");

        let (_, _, cart) = send(&app, "GET", "/api/cart/get", cookie, None).await;
        assert_eq!(cart["cartData"], json!([]));

        let (status, _, orders) = send(&app, "GET", "/api/order/user", cookie, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders["orders"].as_array().unwrap().len(), 1);
        assert_eq!(orders["orders"][0]["id"], placed["order"]["id"]);
    }

    #[tokio::test]
    async fn test_order_routes_require_session_and_address() {
        let app = test_app(1).await;

        let (status, _, _) = send(&app, "GET", "/api/order/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let cookie = register(&app).await;
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/order/place",
            Some(&cookie),
            Some(json!({
                "name": "Ada",
                "phone": "0900000000",
                "address": {"street": "1 Mill Lane", "city": "Hanoi"},
                "items": [{"productId": 1, "size": "", "color": "", "quantity": 1}],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "'address.ward' is required");
    }

    #[tokio::test]
    async fn test_login_logout() {
        let app = test_app(0).await;
        register(&app).await;

        let (status, _, _) = send(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({"email": "shopper@example.com", "password": "wrong password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, cookie, _) = send(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({"email": "Shopper@Example.com", "password": "correct horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.unwrap();

        let (status, _, _) = send(&app, "GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, "POST", "/api/user/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, "GET", "/api/cart/get", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = test_app(0).await;
        register(&app).await;
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({"email": "shopper@example.com", "password": "another one"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_every_response_has_request_id() {
        let app = test_app(0).await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/product/list")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
