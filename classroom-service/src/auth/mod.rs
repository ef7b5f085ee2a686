//! Credential handling: password hashing and access token issuance
//!
//! Token validation lives in [`crate::middleware`].

pub mod password;
pub mod tokens;

pub use password::{PasswordHasher, MIN_PASSWORD_LENGTH};
pub use tokens::jwt_generator::JwtGenerator;
pub use tokens::TokenGenerator;
