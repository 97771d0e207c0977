//! Payment Row Model
//!
//! 独立 payment 表，网关下单或交易同步时写入。
//! 同步以 gateway_payment_id 查询去重，保证幂等。

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::PaymentStatus;
use surrealdb::RecordId;

/// Payment row matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub order: Option<RecordId>,
    pub amount: Decimal,
    pub method: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// Opaque gateway metadata, stored as received
    pub gateway_meta: Option<serde_json::Value>,
    pub status: PaymentStatus,
    pub created_at: i64,
}

/// Create payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    /// Order reference (String ID), if correlated
    pub order_id: Option<String>,
    pub amount: Decimal,
    pub method: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_meta: Option<serde_json::Value>,
    pub status: PaymentStatus,
}
