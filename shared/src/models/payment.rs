//! Payment Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Gateway order requested, payment not yet confirmed
    #[default]
    Created,
    /// Signature-verified payment confirmation received
    Completed,
    Failed,
}

/// Payment record
///
/// 结算后除 status 外不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Option<String>,
    /// Order reference (String ID), absent for gateway-synced transactions
    /// that could not be correlated
    pub order_id: Option<String>,
    /// Amount in major currency units
    pub amount: Decimal,
    pub method: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// Opaque gateway metadata, stored as received
    pub gateway_meta: Option<serde_json::Value>,
    pub status: PaymentStatus,
    pub created_at: i64,
}
