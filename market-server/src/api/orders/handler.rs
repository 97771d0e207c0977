//! User Order Handlers
//!
//! 所有查询按当前用户过滤；他人订单一律表现为 404。

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::ApiResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::OrderCreate;
use crate::db::repository::OrderRepository;
use crate::orders::OrderLifecycle;
use crate::utils::{AppError, AppResult, ok};
use shared::models::Order;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<OrderCreate>,
}

/// POST /api/orders - 结账，创建 PENDING 订单并预留库存
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let user = current.record_id()?;
    let lifecycle = OrderLifecycle::from_state(&state);
    let order = lifecycle.checkout(&user, req.items).await?;
    Ok(ok(order.into()))
}

/// GET /api/orders - 当前用户订单列表
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let user = current.record_id()?;
    let repo = OrderRepository::new(state.db.handle());
    let orders = state.db.guard().run(repo.find_by_user(&user)).await?;
    Ok(ok(orders.into_iter().map(Into::into).collect()))
}

/// GET /api/orders/{id} - 单个订单 (属主校验)
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let user = current.record_id()?;
    let repo = OrderRepository::new(state.db.handle());
    let order = state
        .db
        .guard()
        .run(repo.find_by_id_for_user(&id, &user))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    Ok(ok(order.into()))
}

/// POST /api/orders/{id}/cancel - 取消未支付订单
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let user = current.record_id()?;
    let lifecycle = OrderLifecycle::from_state(&state);
    let order = lifecycle.cancel(&user, &id).await?;
    Ok(ok(order.into()))
}
