//! Payment Handlers
//!
//! 签名验证失败返回 400 且订单不发生任何变化。

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::ApiResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::{GatewayCheckout, OrderLifecycle, VerifyPaymentRequest};
use crate::utils::{AppResult, ok};
use shared::models::Order;

#[derive(Debug, Deserialize)]
pub struct CreateGatewayOrderRequest {
    pub order_id: String,
}

/// POST /api/payments/order - 为本地订单创建网关订单
pub async fn create_gateway_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CreateGatewayOrderRequest>,
) -> AppResult<Json<ApiResponse<GatewayCheckout>>> {
    let user = current.record_id()?;
    let lifecycle = OrderLifecycle::from_state(&state);
    let checkout = lifecycle.create_gateway_order(&user, &req.order_id).await?;
    Ok(ok(checkout))
}

/// POST /api/payments/verify - 验证网关回传签名并结算订单
pub async fn verify(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let user = current.record_id()?;
    let lifecycle = OrderLifecycle::from_state(&state);
    let order = lifecycle.verify_payment(&user, req).await?;
    Ok(ok(order.into()))
}
