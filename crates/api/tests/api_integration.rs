//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{CatalogStore, CategoryRecord, InMemoryStore, ProductRecord};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<api::AppState<InMemoryStore>>) {
    let store = InMemoryStore::new();
    let state = api::create_state(store);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

/// Seeds the two-product scenario: A at 100.00 discounted to 90.00, B at
/// 50.00 plain.
async fn seed_catalog(store: &InMemoryStore) -> (ProductRecord, ProductRecord) {
    let category = store
        .insert_category(CategoryRecord::new("Electronics", "electronics"))
        .await
        .unwrap();

    let a = store
        .insert_product(
            ProductRecord::new("Product A", "product-a", Money::from_cents(10_000), category.id)
                .with_discount(Money::from_cents(9_000))
                .with_stock(10),
        )
        .await
        .unwrap();

    let b = store
        .insert_product(
            ProductRecord::new("Product B", "product-b", Money::from_cents(5_000), category.id)
                .with_stock(5),
        )
        .await
        .unwrap();

    (a, b)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, header: (&str, &str)) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header.0, header.1)
        .body(Body::empty())
        .unwrap()
}

fn json_request(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn register_account(app: &axum::Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            &[],
            serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "first_name": "Test",
                "last_name": "Shopper",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_product_listing_and_detail() {
    let (app, state) = setup();
    seed_catalog(&state.store).await;

    let response = app.clone().oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get("/products?discounted=true"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["slug"], "product-a");
    assert_eq!(json[0]["final_price_cents"], 9_000);

    let response = app.clone().oneshot(get("/products/product-b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["final_price_cents"], 5_000);
    assert_eq!(json["related"].as_array().unwrap().len(), 1);

    let response = app.oneshot(get("/products/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_cart_mints_a_session_token() {
    let (app, _) = setup();

    let response = app.clone().oneshot(get("/cart")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let token = json["session_token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    assert_eq!(json["total_items"], 0);

    // Replaying the token resolves the same cart; no new token is minted.
    let cart_id = json["cart_id"].as_str().unwrap().to_string();
    let response = app
        .oneshot(get_as("/cart", ("x-session-token", &token)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["cart_id"].as_str().unwrap(), cart_id);
    assert!(json["session_token"].is_null());
}

#[tokio::test]
async fn test_cart_totals_follow_mutations() {
    let (app, state) = setup();
    let (a, b) = seed_catalog(&state.store).await;
    let session = ("x-session-token", "shopper-1");

    // 2 × A (90.00 after discount) + 1 × B (50.00) = 230.00, 3 items.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[session],
            serde_json::json!({"product_id": a.id.as_uuid(), "quantity": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[session],
            serde_json::json!({"product_id": b.id.as_uuid()}),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_price_cents"], 23_000);
    assert_eq!(json["total_items"], 3);

    // Driving a line to zero removes it entirely.
    let line_id = json["lines"][0]["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/cart/items/{line_id}"),
            &[session],
            serde_json::json!({"quantity": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["lines"].as_array().unwrap().len(), 1);
    assert_eq!(json["total_price_cents"], 5_000);
}

#[tokio::test]
async fn test_adding_unknown_product_is_not_found() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[("x-session-token", "shopper-1")],
            serde_json::json!({"product_id": uuid::Uuid::new_v4()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_requires_an_account() {
    let (app, state) = setup();
    let (a, _) = seed_catalog(&state.store).await;
    let session = ("x-session-token", "shopper-1");

    app.clone()
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[session],
            serde_json::json!({"product_id": a.id.as_uuid()}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/checkout",
            &[session],
            serde_json::json!({
                "shipping_address": "1 Main St",
                "payment_method": "credit_card",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_rejects_an_empty_cart() {
    let (app, _) = setup();
    let account_id = register_account(&app, "empty-cart").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/checkout",
            &[("x-account-id", &account_id)],
            serde_json::json!({
                "shipping_address": "1 Main St",
                "payment_method": "paypal",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "cart is empty");
}

#[tokio::test]
async fn test_checkout_flow_snapshots_the_cart() {
    let (app, state) = setup();
    let (a, b) = seed_catalog(&state.store).await;
    let account_id = register_account(&app, "buyer").await;
    let account = ("x-account-id", account_id.as_str());

    for (product, quantity) in [(&a, 2), (&b, 1)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/cart/items",
                &[account],
                serde_json::json!({"product_id": product.id.as_uuid(), "quantity": quantity}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            &[account],
            serde_json::json!({
                "shipping_address": "12 Rue des Fleurs, Lyon",
                "payment_method": "credit_card",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = body_json(response).await;
    assert_eq!(order["total_amount_cents"], 23_000);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["lines"].as_array().unwrap().len(), 2);
    assert_eq!(order["billing_address"], "12 Rue des Fleurs, Lyon");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));

    // The cart is empty afterwards; the order shows up in history.
    let response = app.clone().oneshot(get_as("/cart", account)).await.unwrap();
    let cart = body_json(response).await;
    assert_eq!(cart["total_items"], 0);

    let response = app.clone().oneshot(get_as("/orders", account)).await.unwrap();
    let orders = body_json(response).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // Repricing the product later must not touch the committed order.
    state
        .store
        .set_product_price(a.id, Money::from_cents(99_900), None)
        .await
        .unwrap();

    let order_id = order["id"].as_str().unwrap();
    let response = app
        .oneshot(get_as(&format!("/orders/{order_id}"), account))
        .await
        .unwrap();
    let detail = body_json(response).await;
    assert_eq!(detail["total_amount_cents"], 23_000);
    let prices: Vec<i64> = detail["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["unit_price_cents"].as_i64().unwrap())
        .collect();
    assert!(prices.contains(&9_000));
    assert!(prices.contains(&5_000));
}

#[tokio::test]
async fn test_order_detail_is_ownership_checked() {
    let (app, state) = setup();
    let (a, _) = seed_catalog(&state.store).await;
    let buyer_id = register_account(&app, "owner").await;
    let other_id = register_account(&app, "other").await;
    let buyer = ("x-account-id", buyer_id.as_str());

    app.clone()
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[buyer],
            serde_json::json!({"product_id": a.id.as_uuid()}),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            &[buyer],
            serde_json::json!({
                "shipping_address": "1 Main St",
                "payment_method": "cash_on_delivery",
            }),
        ))
        .await
        .unwrap();
    let order = body_json(response).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .oneshot(get_as(
            &format!("/orders/{order_id}"),
            ("x-account-id", other_id.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _) = setup();
    register_account(&app, "alice").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/accounts",
            &[],
            serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profile_round_trip() {
    let (app, _) = setup();
    let account_id = register_account(&app, "profiled").await;
    let account = ("x-account-id", account_id.as_str());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/account/profile",
            &[account],
            serde_json::json!({"city": "Lyon", "phone": "+33 1 23 45 67 89"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_as("/account/profile", account)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["profile"]["city"], "Lyon");
    assert_eq!(json["profile"]["phone"], "33123456789");
    assert_eq!(json["total_spent_cents"], 0);
}

#[tokio::test]
async fn test_admin_surface() {
    let (app, state) = setup();
    let (a, _) = seed_catalog(&state.store).await;
    let account_id = register_account(&app, "admin-buyer").await;
    let account = ("x-account-id", account_id.as_str());

    // Registry listing.
    let response = app.clone().oneshot(get("/admin")).await.unwrap();
    let json = body_json(response).await;
    let entities: Vec<&str> = json["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["entity"].as_str().unwrap())
        .collect();
    assert!(entities.contains(&"orders"));
    assert!(entities.contains(&"products"));

    // Place an order, then bulk-assign it a status.
    app.clone()
        .oneshot(json_request(
            "POST",
            "/cart/items",
            &[account],
            serde_json::json!({"product_id": a.id.as_uuid()}),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/checkout",
            &[account],
            serde_json::json!({
                "shipping_address": "1 Main St",
                "payment_method": "bank_transfer",
            }),
        ))
        .await
        .unwrap();
    let order = body_json(response).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/orders/status",
            &[],
            serde_json::json!({
                "order_ids": [order_id, uuid::Uuid::new_v4()],
                "status": "shipped",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["updated"], 1);

    let response = app
        .clone()
        .oneshot(get_as(&format!("/orders/{order_id}"), account))
        .await
        .unwrap();
    let detail = body_json(response).await;
    assert_eq!(detail["status"], "shipped");

    // Product admin writes.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/admin/products/{}/availability", a.id),
            &[],
            serde_json::json!({"is_available": false}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/products/product-a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
