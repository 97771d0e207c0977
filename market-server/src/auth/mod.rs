//! Authentication Module
//!
//! JWT 双通道认证：用户令牌 (Bearer 头或 `token` cookie) 与管理员令牌
//! (Bearer 头或独立的 `admin_token` cookie，仅对 admin 主体表签发)。

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentAdmin, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};

/// 用户令牌 cookie 名
pub const USER_COOKIE: &str = "token";
/// 管理员令牌 cookie 名 (独立于用户通道)
pub const ADMIN_COOKIE: &str = "admin_token";

/// 从 Cookie 头中提取指定名称的值
pub fn cookie_value<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    let raw = headers.get(http::header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

/// 提取请求携带的令牌：优先 `Authorization: Bearer`，其次指定 cookie
pub fn extract_token<'a>(headers: &'a http::HeaderMap, cookie_name: &str) -> Option<&'a str> {
    if let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        && let Some(token) = header.strip_prefix("Bearer ")
    {
        return Some(token);
    }
    cookie_value(headers, cookie_name)
}
