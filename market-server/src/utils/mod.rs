//! Utilities
//!
//! 错误处理与日志基础设施。

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ok};
pub use shared::ApiResponse;
