//! User accounts

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::auth::{register, CreateUser};
use super::error::{ApiError, ApiOperation};
use crate::middleware::CurrentUser;
use crate::models::{Role, User};
use crate::state::AppState;

/// `GET /users/students`, teachers only
pub async fn list_students(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    user.require_role(Role::Teacher)?;

    let students = state
        .users
        .find_by_role(Role::Student)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;
    Ok(Json(students))
}

/// `POST /users`, any signed-in user
///
/// Same validation and response as `POST /auth/register`.
pub async fn create(
    _user: CurrentUser,
    state: State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    register(state, payload).await
}
