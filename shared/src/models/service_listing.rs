//! B2B Service Listing Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Business-to-business service listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    pub id: Option<String>,
    /// Owning user reference (String ID)
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Quoted price in major currency units
    pub price: Decimal,
    pub contact_email: String,
    pub is_active: bool,
    pub created_at: i64,
}
