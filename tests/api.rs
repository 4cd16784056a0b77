//! End-to-end checks through the HTTP router on the in-memory store

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use poster_shop::api::{self, AppState};
use poster_shop::auth::{JwtService, ADMIN_ROLE, CUSTOMER_ROLE};
use poster_shop::bus::EventBus;
use poster_shop::store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-test-secret-0123456789";

struct TestApp {
    app: Router,
    jwt: JwtService,
}

impl TestApp {
    fn new() -> Self {
        let jwt = JwtService::new(SECRET, 30);
        let state = AppState::new(Arc::new(MemoryStore::new()), EventBus::disabled(), jwt.clone());
        Self { app: api::router(state), jwt }
    }

    fn token(&self, user: &str, role: &str) -> String { self.jwt.issue(user, role).unwrap() }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }
}

fn poster(custom_id: Option<&str>, name: &str, price: f64) -> Value {
    json!({ "customId": custom_id, "name": name, "price": price, "category": "movies", "stock": 10, "image": "https://img.example/x.jpg" })
}

#[tokio::test]
async fn health_is_public() {
    let t = TestApp::new();
    let (status, body) = t.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn cart_requires_a_valid_token() {
    let t = TestApp::new();
    let (status, body) = t.call(Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let forged = JwtService::new(b"some-other-secret-some-other-secret", 30).issue("eve", ADMIN_ROLE).unwrap();
    let (status, _) = t.call(Method::GET, "/api/cart", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_admin_and_lookup() {
    let t = TestApp::new();
    let admin = t.token("root", ADMIN_ROLE);
    let alice = t.token("alice", CUSTOMER_ROLE);

    let (status, _) = t.call(Method::POST, "/api/products", Some(&alice), Some(poster(None, "Alien", 12.0))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, p1) = t.call(Method::POST, "/api/products", Some(&admin), Some(poster(Some("abc123"), "Alien", 10.0))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, p2) = t.call(Method::POST, "/api/products", Some(&admin), Some(poster(None, "Heat", 25.0))).await;

    for price in [-1.0, 10.005, 1e10] {
        let (status, _) = t.call(Method::POST, "/api/products", Some(&admin), Some(poster(None, "Bad", price))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price}");
    }

    let (_, found) = t.call(Method::GET, "/api/products/abc123", None, None).await;
    assert_eq!(found["id"], p1["id"]);
    let uri = format!("/api/products/{}", p2["id"].as_str().unwrap());
    let (_, found) = t.call(Method::GET, &uri, None, None).await;
    assert_eq!(found["name"], "Heat");
    let (_, found) = t.call(Method::GET, "/api/products/ALIEN", None, None).await;
    assert_eq!(found["id"], p1["id"]);
    let (status, body) = t.call(Method::GET, "/api/products/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");

    let (_, listed) = t.call(Method::GET, "/api/products?sort=price-desc", None, None).await;
    assert_eq!(listed[0]["name"], "Heat");
    let (_, listed) = t.call(Method::GET, "/api/products?search=ali", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (status, _) = t.call(Method::GET, "/api/products?category=furniture", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = t.call(Method::PUT, "/api/products/abc123", Some(&admin), Some(json!({ "price": 11.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 11.5);

    let (status, _) = t.call(Method::DELETE, "/api/products/abc123", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.call(Method::GET, "/api/products/abc123", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_upserts_by_custom_id() {
    let t = TestApp::new();
    let admin = t.token("root", ADMIN_ROLE);
    let batch = json!({ "products": [
        { "customId": "fs-1", "name": "Vertigo", "price": 14, "category": "vintage" },
        { "customId": "fs-2", "name": "Psycho", "price": 16, "category": "vintage", "stock": 2 }
    ]});
    let (status, report) = t.call(Method::POST, "/api/products/import", Some(&admin), Some(batch.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report, json!({ "created": 2, "updated": 0 }));
    let (_, report) = t.call(Method::POST, "/api/products/import", Some(&admin), Some(batch)).await;
    assert_eq!(report, json!({ "created": 0, "updated": 2 }));
    let (_, listed) = t.call(Method::GET, "/api/products", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn oversized_cart_total_is_a_bad_request() {
    let t = TestApp::new();
    let admin = t.token("root", ADMIN_ROLE);
    let alice = t.token("alice", CUSTOMER_ROLE);
    let (status, _) = t.call(Method::POST, "/api/products", Some(&admin), Some(poster(Some("gold"), "Gold", 6e9))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t.call(Method::POST, "/api/cart", Some(&alice), Some(json!({ "productId": "gold", "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    let (_, cart) = t.call(Method::GET, "/api/cart", Some(&alice), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cart_to_order_flow() {
    let t = TestApp::new();
    let admin = t.token("root", ADMIN_ROLE);
    let alice = t.token("alice", CUSTOMER_ROLE);
    let bob = t.token("bob", CUSTOMER_ROLE);

    t.call(Method::POST, "/api/products", Some(&admin), Some(poster(Some("p1"), "Alien", 10.0))).await;
    t.call(Method::POST, "/api/products", Some(&admin), Some(poster(Some("p2"), "Heat", 25.0))).await;

    let (status, body) = t.call(Method::POST, "/api/orders", Some(&alice), Some(json!({
        "shippingAddress": { "address": "1 Main St", "city": "York", "postalCode": "YO1", "country": "UK" },
        "paymentMethod": "PayPal"
    }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_CART");

    let (status, cart) = t.call(Method::POST, "/api/cart", Some(&alice), Some(json!({ "productId": "p1", "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total"], 20.0);
    let (_, cart) = t.call(Method::POST, "/api/cart", Some(&alice), Some(json!({ "productId": "p1", "quantity": 3 }))).await;
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(cart["items"][0]["price"], 10.0);
    assert_eq!(cart["total"], 50.0);

    let (status, _) = t.call(Method::POST, "/api/cart", Some(&alice), Some(json!({ "productId": "p1", "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = t.call(Method::PUT, "/api/cart/p1", Some(&alice), Some(json!({ "quantity": 2 }))).await;
    assert_eq!(cart["total"], 20.0);
    t.call(Method::POST, "/api/cart", Some(&alice), Some(json!({ "productId": "p2" }))).await;
    let (status, _) = t.call(Method::PUT, "/api/cart/unknown", Some(&alice), Some(json!({ "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, order) = t.call(Method::POST, "/api/orders", Some(&alice), Some(json!({
        "shippingAddress": { "address": "1 Main St", "city": "York", "postalCode": "YO1", "country": "UK" },
        "paymentMethod": "PayPal"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalPrice"], 45.0);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let (_, cart) = t.call(Method::GET, "/api/cart", Some(&alice), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["total"], 0.0);

    let order_uri = format!("/api/orders/{}", order["id"].as_str().unwrap());
    let (_, mine) = t.call(Method::GET, "/api/orders/myorders", Some(&alice), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (status, _) = t.call(Method::GET, &order_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.call(Method::GET, "/api/orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let status_uri = format!("{order_uri}/status");
    let (status, _) = t.call(Method::PUT, &status_uri, Some(&alice), Some(json!({ "status": "shipped" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, shipped) = t.call(Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "shipped" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipped["status"], "shipped");
    let (status, body) = t.call(Method::PUT, &status_uri, Some(&admin), Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let pay_uri = format!("{order_uri}/pay");
    let payment = json!({ "id": "PAY-1", "status": "COMPLETED", "updateTime": "2024-06-01T10:00:00Z", "emailAddress": "alice@example.com" });
    let (status, _) = t.call(Method::PUT, &pay_uri, Some(&bob), Some(payment.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, paid) = t.call(Method::PUT, &pay_uri, Some(&alice), Some(payment)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["isPaid"], true);
    assert_eq!(paid["status"], "shipped");
    assert_eq!(paid["paymentResult"]["id"], "PAY-1");
}
