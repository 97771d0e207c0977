//! B2B Service Listing Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{ServiceListingCreate, ServiceListingUpdate};
use crate::db::repository::ServiceListingRepository;
use crate::utils::{AppError, AppResult, ok};
use shared::models::ServiceListing;

/// GET /api/services - 公开服务目录
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<ServiceListing>>>> {
    let repo = ServiceListingRepository::new(state.db.handle());
    let listings = state.db.guard().run(repo.find_all_active()).await?;
    Ok(ok(listings.into_iter().map(Into::into).collect()))
}

/// GET /api/services/mine - 当前用户发布的服务 (含已下架)
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<ServiceListing>>>> {
    let user = current.record_id()?;
    let repo = ServiceListingRepository::new(state.db.handle());
    let listings = state.db.guard().run(repo.find_by_user(&user)).await?;
    Ok(ok(listings.into_iter().map(Into::into).collect()))
}

/// POST /api/services - 发布服务
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ServiceListingCreate>,
) -> AppResult<Json<ApiResponse<ServiceListing>>> {
    if req.title.trim().is_empty() {
        return Err(AppError::validation("Title cannot be empty"));
    }
    if req.price.is_sign_negative() {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let user = current.record_id()?;
    let repo = ServiceListingRepository::new(state.db.handle());
    let listing = state.db.guard().run(repo.create(&user, req)).await?;
    Ok(ok(listing.into()))
}

/// PUT /api/services/{id} - 修改服务 (属主校验)
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<ServiceListingUpdate>,
) -> AppResult<Json<ApiResponse<ServiceListing>>> {
    if let Some(price) = &req.price
        && price.is_sign_negative()
    {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let user = current.record_id()?;
    let repo = ServiceListingRepository::new(state.db.handle());
    let listing = state
        .db
        .guard()
        .run(repo.update_owned(&id, &user, req))
        .await?;
    Ok(ok(listing.into()))
}

/// DELETE /api/services/{id} - 下架服务 (软删除)
pub async fn deactivate(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let user = current.record_id()?;
    let repo = ServiceListingRepository::new(state.db.handle());
    state
        .db
        .guard()
        .run(repo.deactivate_owned(&id, &user))
        .await?;
    Ok(ok(()))
}
