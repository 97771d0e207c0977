//! 端到端 API 流程测试
//!
//! 内存数据库 + oneshot 请求，覆盖注册/登录、店面、结账、
//! 支付验证、管理端状态推进与网关同步。

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use market_server::db::repository::AdminRepository;
use market_server::gateway::signature;
use market_server::{Config, ServerState};

const GATEWAY_SECRET: &str = "s3cr3t";
const ADMIN_USER: &str = "admin";
const ADMIN_PASS: &str = "admin123";

async fn test_state(gateway_base_url: Option<String>) -> ServerState {
    let mut config = Config::from_env();
    config.environment = "development".to_string();
    config.gateway.key_id = "key_test".to_string();
    config.gateway.key_secret = GATEWAY_SECRET.to_string();
    if let Some(url) = gateway_base_url {
        config.gateway.base_url = url;
    }

    let state = ServerState::initialize_in_memory(&config)
        .await
        .expect("in-memory state");

    AdminRepository::new(state.db.handle())
        .ensure_admin(ADMIN_USER, ADMIN_PASS)
        .await
        .expect("seed admin");

    state
}

fn test_app(state: &ServerState) -> Router {
    market_server::api::build_app(state).with_state(state.clone())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register_user(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"name": name, "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn admin_login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/auth/login",
        None,
        Some(json!({"username": ADMIN_USER, "password": ADMIN_PASS})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, admin_token: &str, price: &str, stock: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/products",
        Some(admin_token),
        Some(json!({
            "title": "Mechanical Keyboard",
            "description": "87-key, hot-swappable",
            "seller": "Keychron Store",
            "category": "electronics",
            "price": price,
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create product failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn checkout(app: &Router, token: &str, product_id: &str, quantity: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/orders",
        Some(token),
        Some(json!({"items": [{"product_id": product_id, "quantity": quantity}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_full_purchase_flow() {
    let state = test_state(None).await;
    let app = test_app(&state);

    let admin_token = admin_login(&app).await;
    let product_id = create_product(&app, &admin_token, "500.00", 3).await;

    // Storefront is public
    let (status, body) = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let token = register_user(&app, "Jane", "jane@example.com").await;
    let order = checkout(&app, &token, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["payment_status"], "CREATED");

    // Stock reserved at checkout
    let (_, body) = send(&app, "GET", &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(body["data"]["stock"], 2);

    // Verify payment with a valid signature
    let sig = signature::sign("go_1", "gp_1", GATEWAY_SECRET);
    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/verify",
        Some(&token),
        Some(json!({
            "order_id": order_id,
            "gateway_order_id": "go_1",
            "gateway_payment_id": "gp_1",
            "gateway_signature": sig,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "verify failed: {body}");
    assert_eq!(body["data"]["status"], "IN_PROCESS");
    assert_eq!(body["data"]["payment_status"], "COMPLETED");

    // Stock untouched by verification
    let (_, body) = send(&app, "GET", &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(body["data"]["stock"], 2);

    // Admin moves the order to DELIVERED
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/admin/orders/{order_id}/status"),
        Some(&admin_token),
        Some(json!({"status": "DELIVERED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "status update failed: {body}");
    assert_eq!(body["data"]["status"], "DELIVERED");
}

#[tokio::test]
async fn test_invalid_signature_rejected_without_mutation() {
    let state = test_state(None).await;
    let app = test_app(&state);

    let admin_token = admin_login(&app).await;
    let product_id = create_product(&app, &admin_token, "500.00", 3).await;
    let token = register_user(&app, "Jane", "jane@example.com").await;
    let order = checkout(&app, &token, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/verify",
        Some(&token),
        Some(json!({
            "order_id": order_id,
            "gateway_order_id": "go_1",
            "gateway_payment_id": "gp_1",
            "gateway_signature": "00".repeat(32),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("signature"));

    let (_, body) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["payment_status"], "CREATED");
}

#[tokio::test]
async fn test_admin_status_must_be_in_closed_set() {
    let state = test_state(None).await;
    let app = test_app(&state);

    let admin_token = admin_login(&app).await;
    let product_id = create_product(&app, &admin_token, "500.00", 3).await;
    let token = register_user(&app, "Jane", "jane@example.com").await;
    let order = checkout(&app, &token, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/admin/orders/{order_id}/status"),
        Some(&admin_token),
        Some(json!({"status": "SHIPPED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    for option in ["PENDING", "IN_PROCESS", "DELIVERED", "CANCELLED"] {
        assert!(message.contains(option), "message should list {option}: {message}");
    }
}

#[tokio::test]
async fn test_orders_are_scoped_to_their_owner() {
    let state = test_state(None).await;
    let app = test_app(&state);

    let admin_token = admin_login(&app).await;
    let product_id = create_product(&app, &admin_token, "100.00", 5).await;

    let jane = register_user(&app, "Jane", "jane@example.com").await;
    let order = checkout(&app, &jane, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    // A different account sees 404, not 403
    let mallory = register_user(&app, "Mallory", "mallory@example.com").await;
    let (status, _) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Anonymous requests are rejected outright
    let (status, _) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // User tokens cannot reach the admin channel
    let (status, _) = send(&app, "GET", "/api/admin/orders", Some(&jane), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_service_listing_crud() {
    let state = test_state(None).await;
    let app = test_app(&state);

    let token = register_user(&app, "Jane", "jane@example.com").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/services",
        Some(&token),
        Some(json!({
            "title": "Logistics consulting",
            "description": "Cold-chain network design",
            "category": "consulting",
            "price": "1500.00",
            "contact_email": "jane@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create listing failed: {body}");
    let listing_id = body["data"]["id"].as_str().unwrap().to_string();

    // Public directory includes it
    let (status, body) = send(&app, "GET", "/api/services", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Non-owner update is a 404
    let other = register_user(&app, "Mallory", "mallory@example.com").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/services/{listing_id}"),
        Some(&other),
        Some(json!({"title": "hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Owner deactivates; directory is empty again
    let (status, _) = send(&app, "DELETE", &format!("/api/services/{listing_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/services", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_gateway_order_and_payment_sync() {
    // Fake gateway: fixed order id and one listed transaction
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_addr = listener.local_addr().unwrap();
    let fake_gateway = Router::new()
        .route(
            "/v1/orders",
            axum::routing::post(|| async {
                axum::Json(json!({"id": "order_G1", "amount": 50000, "currency": "INR"}))
            }),
        )
        .route(
            "/v1/payments",
            axum::routing::get(|| async {
                axum::Json(json!({"items": [{
                    "id": "pay_G1",
                    "amount": 50000,
                    "currency": "INR",
                    "order_id": "order_G1",
                    "method": "card",
                    "status": "captured",
                }]}))
            }),
        );
    tokio::spawn(async move {
        axum::serve(listener, fake_gateway).await.unwrap();
    });

    let state = test_state(Some(format!("http://{}", gateway_addr))).await;
    let app = test_app(&state);

    let admin_token = admin_login(&app).await;
    let product_id = create_product(&app, &admin_token, "500.00", 3).await;
    let token = register_user(&app, "Jane", "jane@example.com").await;
    let order = checkout(&app, &token, &product_id, 1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/order",
        Some(&token),
        Some(json!({"order_id": order_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "gateway order failed: {body}");
    assert_eq!(body["data"]["gateway_order_id"], "order_G1");
    assert_eq!(body["data"]["amount"], 50000);
    assert_eq!(body["data"]["key_id"], "key_test");

    // Sync pulls the remote transaction; re-running is idempotent
    let (status, body) = send(&app, "POST", "/api/admin/payments/sync", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK, "sync failed: {body}");
    assert_eq!(body["data"]["fetched"], 1);
    assert_eq!(body["data"]["imported"], 1);

    let (_, body) = send(&app, "POST", "/api/admin/payments/sync", Some(&admin_token), None).await;
    assert_eq!(body["data"]["imported"], 0);

    let (status, body) = send(&app, "GET", "/api/admin/payments", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    // One record written at gateway-order time, one imported by sync
    assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["counts"]["completed"], 1);
    assert_eq!(body["data"]["counts"]["created"], 1);
}
