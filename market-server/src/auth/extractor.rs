//! JWT Extractors
//!
//! Custom extractors that validate JWT tokens and produce the current
//! principal. Prefer the middleware-injected extension; fall back to
//! validating the request's own credentials.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::jwt::{SCOPE_ADMIN, SCOPE_USER};
use crate::auth::{ADMIN_COOKIE, CurrentAdmin, CurrentUser, USER_COOKIE, extract_token};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = extract_token(&parts.headers, USER_COOKIE)
            .ok_or_else(|| {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                AppError::unauthorized()
            })?
            .to_string();

        let claims = state
            .get_jwt_service()
            .validate_token(&token)
            .map_err(|_| AppError::invalid_token("Invalid token"))?;
        if claims.scope != SCOPE_USER {
            return Err(AppError::forbidden("User token required"));
        }

        let user = CurrentUser::from(claims);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl FromRequestParts<ServerState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<CurrentAdmin>() {
            return Ok(admin.clone());
        }

        let token = extract_token(&parts.headers, ADMIN_COOKIE)
            .ok_or_else(|| {
                security_log!("WARN", "admin_auth_missing", uri = format!("{:?}", parts.uri));
                AppError::unauthorized()
            })?
            .to_string();

        let claims = state
            .get_jwt_service()
            .validate_token(&token)
            .map_err(|_| AppError::invalid_token("Invalid token"))?;
        if claims.scope != SCOPE_ADMIN {
            return Err(AppError::forbidden("Admin token required"));
        }

        let admin = CurrentAdmin::from(claims);
        parts.extensions.insert(admin.clone());
        Ok(admin)
    }
}
