//! Payment Gateway HTTP Client
//!
//! 远端下单 (`POST /v1/orders`) 与交易列表 (`GET /v1/payments`)。
//! 认证为 basic auth (key_id / key_secret)。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::GatewayConfig;

/// Gateway error
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 网关返回的业务错误 (已提取用户可读消息)
    #[error("Gateway rejected request: {0}")]
    Api(String),
}

impl GatewayError {
    /// Best-effort user-facing message
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Http(_) => "Payment gateway is unreachable".to_string(),
            GatewayError::Api(msg) => msg.clone(),
        }
    }
}

/// Remote reservation created with the payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
}

/// A gateway-side transaction (sync view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    /// Amount in minor currency units
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayPaymentList {
    #[serde(default)]
    items: Vec<GatewayPayment>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Payment gateway client
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Create a remote gateway order for `amount_minor` minor units
    pub async fn create_order(
        &self,
        amount_minor: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount: amount_minor,
                currency: &self.config.currency,
                receipt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(GatewayError::Api(extract_error_message(&body)));
        }

        Ok(response.json::<GatewayOrder>().await?)
    }

    /// List recent gateway transactions (admin sync)
    pub async fn list_payments(&self, count: u32) -> Result<Vec<GatewayPayment>, GatewayError> {
        let url = format!(
            "{}/v1/payments?count={}",
            self.config.base_url.trim_end_matches('/'),
            count
        );
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(GatewayError::Api(extract_error_message(&body)));
        }

        Ok(response.json::<GatewayPaymentList>().await?.items)
    }
}

/// 网关错误体形态不统一，按优先级提取一条用户可读消息：
/// `error.description` → `error.code` → 顶层 `message` → 兜底文案
fn extract_error_message(body: &Value) -> String {
    if let Some(desc) = body
        .get("error")
        .and_then(|e| e.get("description"))
        .and_then(|d| d.as_str())
    {
        return desc.to_string();
    }
    if let Some(code) = body
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
    {
        return format!("Gateway error: {}", code);
    }
    if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
        return message.to_string();
    }
    "Payment gateway request failed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_nested_description() {
        let body = json!({"error": {"description": "Order amount less than minimum", "code": "BAD_REQUEST_ERROR"}});
        assert_eq!(
            extract_error_message(&body),
            "Order amount less than minimum"
        );
    }

    #[test]
    fn test_extract_nested_code() {
        let body = json!({"error": {"code": "BAD_REQUEST_ERROR"}});
        assert_eq!(extract_error_message(&body), "Gateway error: BAD_REQUEST_ERROR");
    }

    #[test]
    fn test_extract_top_level_message() {
        let body = json!({"message": "authentication failed"});
        assert_eq!(extract_error_message(&body), "authentication failed");
    }

    #[test]
    fn test_extract_fallback() {
        assert_eq!(
            extract_error_message(&Value::Null),
            "Payment gateway request failed"
        );
        assert_eq!(
            extract_error_message(&json!({"unexpected": true})),
            "Payment gateway request failed"
        );
    }
}
