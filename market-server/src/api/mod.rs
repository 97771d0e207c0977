//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公开)
//! - [`auth`] - 注册/登录/当前用户
//! - [`products`] - 店面商品 (读公开, 写在 admin 下)
//! - [`orders`] - 用户订单
//! - [`payments`] - 网关下单与支付验证
//! - [`services`] - B2B 服务列表
//! - [`admin`] - 管理端 (独立认证通道)

pub mod convert;

pub mod admin;
pub mod auth;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod services;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{require_admin, require_auth};
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Storefront and user APIs
        .merge(products::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(services::router())
        // Auth API - register/login are public
        .merge(auth::router())
        // Admin API - own token channel
        .merge(admin::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware and state
///
/// This is used by both the HTTP server and test harnesses
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Get user context (JWT authentication) - executes before routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        // Admin token channel - guards /api/admin/* only
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
}
