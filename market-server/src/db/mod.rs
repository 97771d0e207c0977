//! Database Module
//!
//! 嵌入式 SurrealDB 存储：连接句柄、模式索引、弹性访问守卫。

pub mod guard;
pub mod models;
pub mod repository;

pub use guard::{DbGuard, GuardConfig};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use repository::{RepoError, RepoResult};

const NAMESPACE: &str = "market";
const DATABASE: &str = "market";

/// Database service — owns the shared engine handle and the access guard
#[derive(Clone, Debug)]
pub struct DbService {
    db: Surreal<Db>,
    guard: Arc<DbGuard>,
}

impl DbService {
    /// Open the on-disk database (RocksDB engine)
    pub async fn open(dir: &Path, guard: GuardConfig) -> RepoResult<Self> {
        let path = dir.to_string_lossy().to_string();
        let db = Surreal::new::<RocksDb>(path.as_str()).await?;
        Self::init(db, guard).await
    }

    /// Open an in-memory database (tests)
    pub async fn open_in_memory(guard: GuardConfig) -> RepoResult<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        Self::init(db, guard).await
    }

    async fn init(db: Surreal<Db>, guard: GuardConfig) -> RepoResult<Self> {
        db.use_ns(NAMESPACE).use_db(DATABASE).await?;

        let service = Self {
            db,
            guard: Arc::new(DbGuard::new(guard)),
        };
        service.ensure_schema().await?;

        tracing::info!("Database ready (ns={}, db={})", NAMESPACE, DATABASE);
        Ok(service)
    }

    /// 定义唯一索引
    ///
    /// - user.email 唯一 (注册去重)
    /// - admin.username 唯一
    ///
    /// payment.gateway_payment_id 不能建唯一索引：网关下单时该字段
    /// 尚未回填，多条缺省值会互相冲突。同步去重靠查询完成。
    async fn ensure_schema(&self) -> RepoResult<()> {
        self.db
            .query(
                r#"
                DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE;
                DEFINE INDEX IF NOT EXISTS admin_username ON TABLE admin COLUMNS username UNIQUE;
                "#,
            )
            .await?
            .check()?;
        Ok(())
    }

    /// Shared engine handle (cheap clone)
    pub fn handle(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// The resilient access guard
    pub fn guard(&self) -> &DbGuard {
        &self.guard
    }

    /// 数据库探活 (`RETURN 1`)，仅健康检查使用，2 秒超时
    pub async fn probe(&self) -> RepoResult<()> {
        let fut = async {
            self.db.query("RETURN 1").await?.check()?;
            Ok::<(), RepoError>(())
        };
        match tokio::time::timeout(Duration::from_secs(2), fut).await {
            Ok(result) => result,
            Err(_) => Err(RepoError::Transient("health probe timed out".to_string())),
        }
    }

    /// Teardown is intentionally a no-op: the handle is shared process-wide
    /// and must outlive any single request.
    pub async fn close(&self) {
        tracing::debug!("DbService::close called; shared handle stays open");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ProductCreate;
    use crate::db::repository::ProductRepository;

    #[tokio::test]
    async fn test_on_disk_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = DbService::open(dir.path(), GuardConfig::default())
            .await
            .expect("open rocksdb");

        let repo = ProductRepository::new(db.handle());
        let created = repo
            .create(ProductCreate {
                title: "Desk Lamp".to_string(),
                description: "LED, warm white".to_string(),
                seller: "Lumen Co".to_string(),
                category: "home".to_string(),
                price: "35.00".parse().unwrap(),
                stock: 10,
            })
            .await
            .expect("create product");

        let id = created.id.as_ref().unwrap().to_string();
        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.title, "Desk Lamp");
        assert_eq!(found.stock, 10);

        db.close().await;
    }

    #[tokio::test]
    async fn test_probe_reports_healthy_engine() {
        let db = DbService::open_in_memory(GuardConfig::default())
            .await
            .unwrap();
        db.probe().await.expect("probe should succeed");
        assert_eq!(db.guard().failure_count(), 0);
    }
}
