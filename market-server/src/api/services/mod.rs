//! B2B Service Listing API 模块
//!
//! 目录读取公开；发布与修改要求登录且仅限属主。

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/services", service_routes())
}

fn service_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/mine", get(handler::list_mine))
        .route("/{id}", put(handler::update).delete(handler::deactivate))
}
