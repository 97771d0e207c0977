//! Admin Model
//!
//! 独立的管理员主体表，与普通用户分离。管理员令牌仅对该表的主体签发。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Admin row matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub username: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub created_at: i64,
}
