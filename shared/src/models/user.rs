//! User Model

use serde::{Deserialize, Serialize};

/// Public view of a user (no credentials)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub created_at: i64,
}
