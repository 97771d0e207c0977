//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::jwt::{SCOPE_ADMIN, SCOPE_USER};
use crate::auth::{ADMIN_COOKIE, CurrentAdmin, CurrentUser, JwtError, USER_COOKIE, extract_token};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头或 `token` cookie 提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (健康检查等)
/// - `/api/auth/*` (注册/登录)
/// - `GET /api/products*` (公开店面)
/// - `GET /api/services` (公开服务目录)
/// - `/api/admin/*` (由 [`require_admin`] 独立守卫)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if method == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let is_public_api_route = path.starts_with("/api/auth/")
        || path.starts_with("/api/admin/")
        || (method == http::Method::GET && path.starts_with("/api/products"))
        || (method == http::Method::GET && path == "/api/services");
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let token = match extract_token(req.headers(), USER_COOKIE) {
        Some(token) => token.to_string(),
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    match state.get_jwt_service().validate_token(&token) {
        Ok(claims) if claims.scope == SCOPE_USER => {
            req.extensions_mut().insert(CurrentUser::from(claims));
            Ok(next.run(req).await)
        }
        Ok(claims) => {
            security_log!(
                "WARN",
                "auth_wrong_scope",
                scope = claims.scope,
                uri = format!("{:?}", req.uri())
            );
            Err(AppError::forbidden("User token required"))
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 管理员中间件 - 仅接受 admin 通道令牌
///
/// 令牌来自 `Authorization: Bearer` 或独立的 `admin_token` cookie。
/// 用户令牌访问管理接口返回 403。
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 只守卫管理端路径
    if !req.uri().path().starts_with("/api/admin/") {
        return Ok(next.run(req).await);
    }

    // 管理员登录接口本身是公开的
    if req.uri().path() == "/api/admin/auth/login" {
        return Ok(next.run(req).await);
    }

    let token = match extract_token(req.headers(), ADMIN_COOKIE) {
        Some(token) => token.to_string(),
        None => {
            security_log!("WARN", "admin_auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    match state.get_jwt_service().validate_token(&token) {
        Ok(claims) if claims.scope == SCOPE_ADMIN => {
            req.extensions_mut().insert(CurrentAdmin::from(claims));
            Ok(next.run(req).await)
        }
        Ok(_) => {
            security_log!("WARN", "admin_scope_violation", uri = format!("{:?}", req.uri()));
            Err(AppError::forbidden("Admin token required"))
        }
        Err(e) => {
            security_log!(
                "WARN",
                "admin_auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
