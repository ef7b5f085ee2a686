//! Access token generation
//!
//! # Example
//!
//! ```rust,ignore
//! use classroom_service::auth::{JwtGenerator, TokenGenerator};
//! use classroom_service::models::Role;
//!
//! let generator = JwtGenerator::new(&config.jwt)?;
//! let token = generator.generate_token(user.id, Role::Teacher)?;
//! ```

pub mod jwt_generator;

use std::time::Duration;

use crate::error::Error;
use crate::models::Role;

/// Issues signed access tokens for authenticated users
pub trait TokenGenerator: Send + Sync + Clone {
    /// Token for `user_id` acting as `role`, valid for [`default_lifetime`](Self::default_lifetime)
    fn generate_token(&self, user_id: i64, role: Role) -> Result<String, Error>;

    /// How long issued tokens stay valid
    fn default_lifetime(&self) -> Duration;
}
