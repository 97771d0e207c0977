//! Shared types for the marketplace platform
//!
//! Domain models and the unified API response envelope used by the
//! server and by API clients. Keeps the wire format in one place.

pub mod models;
pub mod response;
pub mod util;

pub use models::{
    Order, OrderDetail, OrderItem, OrderStatus, Payment, PaymentStatus, Product, ServiceListing,
    UserPublic,
};
pub use response::{API_CODE_SUCCESS, ApiResponse};
