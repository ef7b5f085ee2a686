//! Role and ownership checks for authenticated routes
//!
//! [`CurrentUser`] is extracted from the [`Claims`] that
//! [`JwtAuth`](super::JwtAuth) placed in the request extensions.
//!
//! ```rust,ignore
//! async fn list_students(user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
//!     user.require_role(Role::Teacher)?;
//!     // ...
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::token::Claims;
use crate::handlers::ApiError;
use crate::models::Role;

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    /// Fail with 403 unless the caller has `role`
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            return Ok(());
        }
        Err(ApiError::forbidden(format!(
            "Forbidden: Requires role '{}'",
            role.as_str()
        )))
    }

    /// Fail with 403 unless the caller is a teacher or the student `student_id` themself
    pub fn ensure_related_student(&self, student_id: i64) -> Result<(), ApiError> {
        if self.role == Role::Teacher || self.id == student_id {
            return Ok(());
        }
        Err(ApiError::forbidden(
            "Forbidden: You can only access your own records",
        ))
    }
}

impl TryFrom<&Claims> for CurrentUser {
    type Error = ApiError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = claims
            .user_id()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: No user found"))?;
        Ok(Self {
            id,
            role: claims.role,
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: No user found"))
            .and_then(Self::try_from)
    }
}
