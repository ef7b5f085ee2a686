//! HTTP handlers, request validation and error mapping

pub mod assignments;
pub mod auth;
pub mod error;
pub mod grades;
pub mod query;
pub mod users;

pub use auth::{CreateUser, Login, LoginResponse};
pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use query::ListParams;
