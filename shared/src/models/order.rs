//! Order Model
//!
//! 订单状态机:
//!
//! ```text
//! PENDING ──> IN_PROCESS ──> DELIVERED
//!    │             │
//!    └──────┬──────┘
//!           v
//!       CANCELLED
//! ```
//!
//! DELIVERED 和 CANCELLED 为终态。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserPublic;
use crate::models::payment::PaymentStatus;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProcess,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All valid statuses, in lifecycle order
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProcess,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire representation (SCREAMING_SNAKE_CASE)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProcess => "IN_PROCESS",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// 终态不再接受任何转换
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Forward-only transition check
    ///
    /// PENDING → IN_PROCESS → DELIVERED, plus cancellation from any
    /// non-terminal state. Self-transitions are rejected.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match (self, target) {
            (OrderStatus::Pending, OrderStatus::InProcess) => true,
            (OrderStatus::InProcess, OrderStatus::Delivered) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,
            (OrderStatus::InProcess, OrderStatus::Cancelled) => true,
            _ => false,
        }
    }

    /// Comma-separated list of the valid statuses, used in validation errors
    pub fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "IN_PROCESS" => Ok(OrderStatus::InProcess),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!(
                "Invalid status '{}'. Valid options: {}",
                other,
                OrderStatus::valid_options()
            )),
        }
    }
}

/// Order line item (snapshot taken at checkout)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product reference (String ID)
    pub product_id: String,
    /// Product title at time of purchase
    pub title: String,
    pub quantity: i64,
    /// Unit price in major currency units
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    /// Owning user reference (String ID)
    pub user_id: String,
    pub items: Vec<OrderItem>,
    /// Total amount in major currency units
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Gateway correlation fields, set once payment is initiated/verified
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    /// Millis timestamp of signature-verified payment
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order with user detail attached (admin views)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<UserPublic>,
}
