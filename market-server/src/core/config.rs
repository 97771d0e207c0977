use crate::auth::JwtConfig;
use crate::db::GuardConfig;
use crate::gateway::GatewayConfig;

/// 服务器配置 - 市场平台的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/market | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DB_FAILURE_THRESHOLD | 3 | 数据库连续失败阈值 |
/// | DB_COOLDOWN_MS | 30000 | 数据库冷却时间(毫秒) |
/// | ENFORCE_STATUS_FLOW | false | 管理端是否强制正向状态流 |
/// | GATEWAY_URL | https://api.gateway.test | 支付网关地址 |
/// | GATEWAY_KEY_ID | - | 网关公钥 ID |
/// | GATEWAY_KEY_SECRET | - | 网关私钥 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/market HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 支付网关配置
    pub gateway: GatewayConfig,
    /// 数据库弹性守卫配置
    pub guard: GuardConfig,
    /// 管理端状态更新是否强制正向状态流
    ///
    /// 默认 false: 管理端为操作员覆写通道，仅校验目标状态合法。
    pub enforce_status_flow: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/market".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            gateway: GatewayConfig::from_env(),
            guard: GuardConfig::from_env(),
            enforce_status_flow: std::env::var("ENFORCE_STATUS_FLOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
