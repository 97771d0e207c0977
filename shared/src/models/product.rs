//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storefront product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Seller display name
    pub seller: String,
    pub category: String,
    /// Price in major currency units
    pub price: Decimal,
    /// Units in stock; reserved (decremented) at checkout
    pub stock: i64,
    pub is_active: bool,
    pub created_at: i64,
}
