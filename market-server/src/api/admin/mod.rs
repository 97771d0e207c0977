//! Admin API 模块
//!
//! 管理端接口，全部挂在 `/api/admin` 下，由独立的 admin 令牌
//! 通道守卫 (`require_admin`)。登录接口本身公开。

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth/login", post(handler::login))
        // Orders
        .route("/orders", get(handler::list_orders))
        .route("/orders/{id}/status", put(handler::update_order_status))
        // Products
        .route("/products", get(handler::list_products).post(handler::create_product))
        .route(
            "/products/{id}",
            put(handler::update_product).delete(handler::delete_product),
        )
        // Payments
        .route("/payments", get(handler::list_payments))
        .route("/payments/sync", post(handler::sync_payments))
}
