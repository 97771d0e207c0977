//! Authentication Handlers
//!
//! 注册、登录与当前用户信息。登录失败统一返回同一条消息，
//! 避免账号枚举。

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::ApiResponse;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, verify_password};
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::{AppError, AppResult, ok};
use shared::models::UserPublic;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

/// POST /api/auth/register - 注册并立即签发令牌
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = UserRepository::new(state.db.handle());
    let user = state
        .db
        .guard()
        .run(repo.create(UserCreate {
            name: req.name,
            email: req.email,
            password: req.password,
        }))
        .await?;

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("Created user has no id"))?;
    let token = state
        .get_jwt_service()
        .generate_user_token(&user_id, &user.email)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    tracing::info!(user = %user_id, "User registered");
    Ok(ok(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login - 邮箱+密码登录
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let repo = UserRepository::new(state.db.handle());
    let user = state
        .db
        .guard()
        .run(repo.find_by_email(&req.email))
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            security_log!("WARN", "login_failed", email = req.email.clone());
            return Err(AppError::invalid_credentials());
        }
    };

    let password_valid = verify_password(&req.password, &user.hash_pass)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !password_valid {
        security_log!("WARN", "login_failed", email = req.email.clone());
        return Err(AppError::invalid_credentials());
    }

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("User row has no id"))?;
    let token = state
        .get_jwt_service()
        .generate_user_token(&user_id, &user.email)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    Ok(ok(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me - 当前登录用户
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<ApiResponse<UserPublic>>> {
    let repo = UserRepository::new(state.db.handle());
    let user = state
        .db
        .guard()
        .run(repo.find_by_id(&current.id))
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ok(user.into()))
}
