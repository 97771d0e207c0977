//! Payment API 模块
//!
//! 网关下单与支付验证，均要求用户登录。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", payment_routes())
}

fn payment_routes() -> Router<ServerState> {
    Router::new()
        .route("/order", post(handler::create_gateway_order))
        .route("/verify", post(handler::verify))
}
