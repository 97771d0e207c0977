//! Database Models
//!
//! SurrealDB row types. Converted to `shared::models` before leaving the
//! server (see `api::convert`).

// Serde helpers
pub mod serde_helpers;

// Auth
pub mod admin;
pub mod user;

// Catalog
pub mod product;
pub mod service_listing;

// Orders
pub mod order;
pub mod payment;

// Re-exports
pub use admin::Admin;
pub use order::{OrderCreate, OrderItemRow, OrderRow};
pub use payment::{PaymentCreate, PaymentRow};
pub use product::{ProductCreate, ProductRow, ProductUpdate};
pub use service_listing::{ServiceListingCreate, ServiceListingRow, ServiceListingUpdate};
pub use user::{User, UserCreate};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password with argon2id
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(
    password: &str,
    stored_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hash).unwrap());
        assert!(!verify_password("hunter3!", &hash).unwrap());
    }
}
