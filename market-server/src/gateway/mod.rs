//! Payment Gateway Module
//!
//! 外部支付网关边界：远端下单、交易列表、回调签名验证。
//! 网关本身是黑盒 HTTP API；凭据来自环境变量。

pub mod client;
pub mod signature;

pub use client::{GatewayClient, GatewayError, GatewayOrder, GatewayPayment};

/// 支付网关配置
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 网关 API 地址
    pub base_url: String,
    /// 公钥 ID (随下单响应返回给前端)
    pub key_id: String,
    /// 私钥 (HMAC 签名密钥 + API 认证)
    pub key_secret: String,
    /// 结算货币 (ISO 4217)
    pub currency: String,
    /// 最小下单金额 (最小货币单位)
    pub min_amount_minor: i64,
}

impl GatewayConfig {
    /// 从环境变量加载 (GATEWAY_URL / GATEWAY_KEY_ID / GATEWAY_KEY_SECRET / GATEWAY_CURRENCY)
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.gateway.test".into()),
            key_id: std::env::var("GATEWAY_KEY_ID").unwrap_or_default(),
            key_secret: std::env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
            currency: std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "INR".into()),
            min_amount_minor: 100,
        }
    }
}
