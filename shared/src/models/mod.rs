//! API Models
//!
//! Wire-format models returned by the marketplace API. Database rows are
//! converted into these before leaving the server.

pub mod order;
pub mod payment;
pub mod product;
pub mod service_listing;
pub mod user;

pub use order::{Order, OrderDetail, OrderItem, OrderStatus};
pub use payment::{Payment, PaymentStatus};
pub use product::Product;
pub use service_listing::ServiceListing;
pub use user::UserPublic;
