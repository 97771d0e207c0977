//! Order Row Model

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{OrderStatus, PaymentStatus};
use surrealdb::RecordId;

/// Order line item, snapshotted at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRow {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// Title at time of purchase
    pub title: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Order row matching SurrealDB schema
///
/// 订单永不硬删除；状态由支付验证与管理端操作推进。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    // CREATE ... CONTENT 创建时 id 必须缺省，由引擎生成
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub items: Vec<OrderItemRow>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Checkout request item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    /// Product reference (String ID)
    pub product_id: String,
    pub quantity: i64,
}
