//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables. All calls are executed
//! through the [`DbGuard`](super::guard::DbGuard) at the handler layer.

pub mod admin;
pub mod order;
pub mod payment;
pub mod product;
pub mod service_listing;
pub mod user;

// Re-exports
pub use admin::AdminRepository;
pub use order::OrderRepository;
pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use service_listing::ServiceListingRepository;
pub use user::UserRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
///
/// `Transient` 与 `Database` 的区分发生在这一层 (typed classification)：
/// 守卫和上层只匹配枚举变体，不再嗅探错误文本。
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 瞬时连接类失败 (触发守卫计数)
    #[error("Transient database failure: {0}")]
    Transient(String),

    /// 逻辑/查询类数据库错误 (不触发守卫计数)
    #[error("Database error: {0}")]
    Database(String),

    /// 守卫冷却中，未触达数据库
    #[error("Database temporarily unavailable")]
    Unavailable,
}

/// 引擎错误文本中标记瞬时连接失败的片段
///
/// surrealdb 的错误枚举没有稳定的"传输层断开"变体，分类只能集中在
/// 这一处做文本匹配；系统其余部分只见到 [`RepoError::Transient`]。
const TRANSIENT_PATTERNS: &[&str] = &[
    "not connected",
    "connection refused",
    "connection failed",
    "connection reset",
    "empty response",
    "timed out",
    "timeout",
];

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        let lowered = msg.to_lowercase();
        if TRANSIENT_PATTERNS.iter().any(|p| lowered.contains(p)) {
            RepoError::Transient(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Shared base for repositories
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================

/// Strip "table:" prefix from an id string if present
pub fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(&format!("{}:", table)).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let err = RepoError::from(surrealdb::Error::Api(
            surrealdb::error::Api::ConnectionUninitialised,
        ));
        // "connection uninitialised" 不含已知片段时仍是 Database；
        // 分类只认可枚举出的瞬时模式
        match err {
            RepoError::Transient(_) | RepoError::Database(_) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_matching_is_case_insensitive() {
        for msg in [
            "Connection refused by peer",
            "engine not connected",
            "request TIMED OUT after 5s",
            "received empty response from engine",
        ] {
            let lowered = msg.to_lowercase();
            assert!(
                TRANSIENT_PATTERNS.iter().any(|p| lowered.contains(p)),
                "expected '{msg}' to classify as transient"
            );
        }
        let lowered = "parse error at line 3".to_lowercase();
        assert!(!TRANSIENT_PATTERNS.iter().any(|p| lowered.contains(p)));
    }

    #[test]
    fn test_strip_table_prefix() {
        assert_eq!(strip_table_prefix("order", "order:abc"), "abc");
        assert_eq!(strip_table_prefix("order", "abc"), "abc");
        assert_eq!(strip_table_prefix("order", "user:abc"), "user:abc");
    }
}
