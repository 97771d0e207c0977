//! Admin Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ApiResponse;

use crate::core::ServerState;
use crate::db::models::{PaymentCreate, ProductCreate, ProductUpdate, verify_password};
use crate::db::repository::{
    AdminRepository, OrderRepository, PaymentRepository, ProductRepository, UserRepository,
};
use crate::orders::OrderLifecycle;
use crate::security_log;
use crate::utils::{AppError, AppResult, ok};
use shared::models::{Order, OrderDetail, Payment, PaymentStatus, Product};

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub username: String,
}

/// POST /api/admin/auth/login - 管理员登录 (独立主体表)
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AdminLoginResponse>>> {
    let repo = AdminRepository::new(state.db.handle());
    let admin = state
        .db
        .guard()
        .run(repo.find_by_username(&req.username))
        .await?;

    let admin = match admin {
        Some(a) => a,
        None => {
            security_log!("WARN", "admin_login_failed", username = req.username.clone());
            return Err(AppError::invalid_credentials());
        }
    };

    let password_valid = verify_password(&req.password, &admin.hash_pass)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !password_valid {
        security_log!("WARN", "admin_login_failed", username = req.username.clone());
        return Err(AppError::invalid_credentials());
    }

    let admin_id = admin
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("Admin row has no id"))?;
    let token = state
        .get_jwt_service()
        .generate_admin_token(&admin_id, &admin.username)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    security_log!("INFO", "admin_login", username = admin.username.clone());
    Ok(ok(AdminLoginResponse {
        token,
        username: admin.username,
    }))
}

// =============================================================================
// Orders
// =============================================================================

/// GET /api/admin/orders - 全量订单列表，附带下单用户信息
pub async fn list_orders(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<OrderDetail>>>> {
    let guard = state.db.guard();
    let orders = guard
        .run(OrderRepository::new(state.db.handle()).find_all())
        .await?;

    let user_ids: Vec<_> = orders.iter().map(|o| o.user.clone()).collect();
    let users = guard
        .run(UserRepository::new(state.db.handle()).find_by_ids(user_ids))
        .await?;
    let users_by_id: HashMap<String, _> = users
        .into_iter()
        .filter_map(|u| u.id.as_ref().map(|id| (id.to_string(), u.clone())))
        .collect();

    let details = orders
        .into_iter()
        .map(|row| {
            let user = users_by_id.get(&row.user.to_string()).cloned();
            OrderDetail {
                order: Order::from(row),
                user: user.map(Into::into),
            }
        })
        .collect();
    Ok(ok(details))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/admin/orders/{id}/status - 订单状态变更
///
/// 状态必须属于固定四值集合，否则 400 并列出有效选项。
/// 响应附带下单用户与行项目明细。
pub async fn update_order_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let lifecycle = OrderLifecycle::from_state(&state);
    let row = lifecycle.admin_set_status(&id, &req.status).await?;

    let user = state
        .db
        .guard()
        .run(UserRepository::new(state.db.handle()).find_by_id(&row.user.to_string()))
        .await?;

    Ok(ok(OrderDetail {
        order: Order::from(row),
        user: user.map(Into::into),
    }))
}

// =============================================================================
// Products
// =============================================================================

/// GET /api/admin/products - 全量商品 (含下架)
pub async fn list_products(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.db.handle());
    let products = state.db.guard().run(repo.find_all()).await?;
    Ok(ok(products.into_iter().map(Into::into).collect()))
}

/// POST /api/admin/products - 上架商品
pub async fn create_product(
    State(state): State<ServerState>,
    Json(req): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let repo = ProductRepository::new(state.db.handle());
    let product = state.db.guard().run(repo.create(req)).await?;
    Ok(ok(product.into()))
}

/// PUT /api/admin/products/{id} - 修改商品
pub async fn update_product(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    if let Some(price) = &req.price
        && price.is_sign_negative()
    {
        return Err(AppError::validation("Price cannot be negative"));
    }
    if let Some(stock) = req.stock
        && stock < 0
    {
        return Err(AppError::validation("Stock cannot be negative"));
    }

    let repo = ProductRepository::new(state.db.handle());
    let product = state.db.guard().run(repo.update(&id, req)).await?;
    Ok(ok(product.into()))
}

/// DELETE /api/admin/products/{id} - 删除商品 (订单保留快照)
pub async fn delete_product(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let repo = ProductRepository::new(state.db.handle());
    let deleted = state.db.guard().run(repo.delete(&id)).await?;
    if !deleted {
        return Err(AppError::not_found(format!("Product {} not found", id)));
    }
    Ok(ok(()))
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PaymentsOverview {
    pub payments: Vec<Payment>,
    /// Sum of COMPLETED payment amounts (major units)
    pub total_completed: Decimal,
    pub counts: PaymentCounts,
}

#[derive(Debug, Serialize)]
pub struct PaymentCounts {
    pub created: usize,
    pub completed: usize,
    pub failed: usize,
}

/// GET /api/admin/payments - 支付聚合视图 (记录 + 合计)
pub async fn list_payments(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<PaymentsOverview>>> {
    let repo = PaymentRepository::new(state.db.handle());
    let rows = state.db.guard().run(repo.find_all()).await?;

    let mut total_completed = Decimal::ZERO;
    let mut counts = PaymentCounts {
        created: 0,
        completed: 0,
        failed: 0,
    };
    for row in &rows {
        match row.status {
            PaymentStatus::Created => counts.created += 1,
            PaymentStatus::Completed => {
                counts.completed += 1;
                total_completed += row.amount;
            }
            PaymentStatus::Failed => counts.failed += 1,
        }
    }

    Ok(ok(PaymentsOverview {
        payments: rows.into_iter().map(Into::into).collect(),
        total_completed,
        counts,
    }))
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    /// Transactions fetched from the gateway
    pub fetched: usize,
    /// New records imported (dedupe by gateway payment id)
    pub imported: usize,
}

/// Number of recent gateway transactions pulled per sync
const SYNC_BATCH_SIZE: u32 = 100;

/// POST /api/admin/payments/sync - 从网关拉取交易并导入本地
///
/// 以 gateway_payment_id 去重，重复同步幂等。
pub async fn sync_payments(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<SyncResult>>> {
    let remote = state.gateway.list_payments(SYNC_BATCH_SIZE).await?;
    let repo = PaymentRepository::new(state.db.handle());
    let guard = state.db.guard();

    let fetched = remote.len();
    let mut imported = 0usize;

    for payment in remote {
        let existing = guard
            .run(repo.find_by_gateway_payment_id(&payment.id))
            .await?;
        if existing.is_some() {
            continue;
        }

        let status = match payment.status.as_deref() {
            Some("captured") | Some("settled") => PaymentStatus::Completed,
            Some("failed") => PaymentStatus::Failed,
            _ => PaymentStatus::Created,
        };
        let meta = serde_json::to_value(&payment).ok();

        guard
            .run(repo.create(PaymentCreate {
                order_id: None,
                // Minor units back to major with two decimals
                amount: Decimal::new(payment.amount, 2),
                method: payment.method.clone().unwrap_or_else(|| "gateway".to_string()),
                gateway_order_id: payment.order_id.clone(),
                gateway_payment_id: Some(payment.id.clone()),
                gateway_meta: meta,
                status,
            }))
            .await?;
        imported += 1;
    }

    tracing::info!(fetched, imported, "Gateway payment sync finished");
    Ok(ok(SyncResult { fetched, imported }))
}
