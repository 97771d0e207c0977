use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::AdminRepository;
use crate::gateway::GatewayClient;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务端的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | 嵌入式数据库 + 弹性守卫 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | gateway | Arc<GatewayClient> | 支付网关客户端 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务 (共享连接句柄 + 失败计数守卫)
    pub db: DbService,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 支付网关客户端
    pub gateway: Arc<GatewayClient>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize`] 代替
    pub fn new(
        config: Config,
        db: DbService,
        jwt_service: Arc<JwtService>,
        gateway: Arc<GatewayClient>,
    ) -> Self {
        Self {
            config,
            db,
            jwt_service,
            gateway,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database, RocksDB 引擎) + 索引
    /// 3. JWT 服务、网关客户端
    /// 4. 默认管理员 (仅开发环境)
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let db_dir = PathBuf::from(&config.work_dir).join("database");
        std::fs::create_dir_all(&db_dir)?;

        let db = DbService::open(&db_dir, config.guard.clone()).await?;

        let state = Self {
            config: config.clone(),
            db,
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            gateway: Arc::new(GatewayClient::new(config.gateway.clone())),
        };

        state.seed_default_admin().await;

        Ok(state)
    }

    /// 初始化内存数据库状态 (测试用)
    pub async fn initialize_in_memory(config: &Config) -> anyhow::Result<Self> {
        let db = DbService::open_in_memory(config.guard.clone()).await?;

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            gateway: Arc::new(GatewayClient::new(config.gateway.clone())),
        })
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 开发环境下确保存在默认管理员账号
    ///
    /// 账号来自 ADMIN_USERNAME / ADMIN_PASSWORD。生产环境缺失凭据时只警告，
    /// 不会创建默认账号。
    async fn seed_default_admin(&self) {
        let username = std::env::var("ADMIN_USERNAME").ok();
        let password = std::env::var("ADMIN_PASSWORD").ok();

        let (username, password) = match (username, password) {
            (Some(u), Some(p)) => (u, p),
            _ if self.config.is_development() => ("admin".to_string(), "admin123".to_string()),
            _ => {
                tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; no admin account seeded");
                return;
            }
        };

        let repo = AdminRepository::new(self.db.handle());
        match repo.ensure_admin(&username, &password).await {
            Ok(true) => tracing::info!(username = %username, "Default admin account created"),
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Failed to seed admin account"),
        }
    }
}
