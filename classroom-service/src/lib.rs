//! # classroom-service
//!
//! Classroom REST API: students submit assignments, teachers grade them by
//! hand or with an AI suggestion, and everyone browses paginated, searchable
//! listings.
//!
//! ## Features
//!
//! - **Paged listings**: one pagination engine shared by every entity, with
//!   search across joined tables, subject and student filters, and
//!   `{data, page, limit, total, totalPages}` envelopes
//! - **Auth**: Argon2id passwords, HS256 JWTs, role and ownership guards
//! - **Notifications**: new-assignment notices on a Redis channel
//! - **Middleware stack**: request tracking, panic recovery, body size limits,
//!   compression, CORS
//! - **Graceful shutdown**: SIGTERM and SIGINT
//!
//! ## Example
//!
//! ```rust,no_run
//! use classroom_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let pool = database::connect(&config.database).await?;
//!     let state = AppState::builder(config.clone(), pool).build().await?;
//!
//!     Server::new(config).serve(router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod grading;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod observability;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;

/// Commonly used types
pub mod prelude {
    pub use crate::auth::{JwtGenerator, PasswordHasher, TokenGenerator};
    pub use crate::config::Config;
    pub use crate::database;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, ListParams};
    pub use crate::health::{health, readiness};
    pub use crate::middleware::{Claims, CurrentUser, JwtAuth, TokenValidator};
    pub use crate::models::{Assignment, Grade, Role, Subject, User};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        AssignmentListQuery, AssignmentRepository, GradeListQuery, GradeRepository, PagedResult,
        PaginationRequest, SortOrder, TotalPagesPolicy, UserRepository,
    };
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::{AppState, AppStateBuilder};
}
