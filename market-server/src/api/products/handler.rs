//! Storefront Product Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;

use crate::core::ServerState;
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult, ok};
use shared::models::Product;

/// GET /api/products - 在售商品列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.db.handle());
    let products = state.db.guard().run(repo.find_all_active()).await?;
    Ok(ok(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products/{id} - 单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let repo = ProductRepository::new(state.db.handle());
    let product = state
        .db
        .guard()
        .run(repo.find_by_id(&id))
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(ok(product.into()))
}
