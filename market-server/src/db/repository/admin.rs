//! Admin Repository
//!
//! 管理员主体表访问。管理员账号通过启动种子或运维手段创建，
//! 没有自助注册入口。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Admin, hash_password};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct AdminRepository {
    base: BaseRepository,
}

impl AdminRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find admin by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<Admin>> {
        let username_owned = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM admin WHERE username = $username LIMIT 1")
            .bind(("username", username_owned))
            .await?;
        let admins: Vec<Admin> = result.take(0)?;
        Ok(admins.into_iter().next())
    }

    /// Create the admin account if it does not exist. Returns true if created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> RepoResult<bool> {
        if self.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let hash_pass = hash_password(password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE admin SET
                    username = $username,
                    hash_pass = $hash_pass,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("username", username.to_string()))
            .bind(("hash_pass", hash_pass))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<Admin> = result.take(0)?;
        created
            .map(|_| true)
            .ok_or_else(|| RepoError::Database("Failed to create admin".to_string()))
    }
}
