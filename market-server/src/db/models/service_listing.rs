//! B2B Service Listing Model

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Service listing row matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListingRow {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub contact_email: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create listing payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListingCreate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub contact_email: String,
}

/// Update listing payload (owner-scoped)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
