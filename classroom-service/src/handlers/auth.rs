//! Registration and login

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorKind, ApiOperation};
use crate::auth::{TokenGenerator, MIN_PASSWORD_LENGTH};
use crate::models::{Role, User};
use crate::repository::NewUser;
use crate::state::AppState;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

const ROLE_MESSAGE: &str = "The role must be either 'student' or 'teacher'.";

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Checked against [`Role`] so the error names the accepted values
    pub role: String,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// Issued token and the account it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(ApiError::bad_request("email must be an email"))
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password minimum length of {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    match role {
        "student" => Ok(Role::Student),
        "teacher" => Ok(Role::Teacher),
        _ => Err(ApiError::bad_request(ROLE_MESSAGE)),
    }
}

impl CreateUser {
    fn validate(&self) -> Result<Role, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request("name should not be empty"));
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        parse_role(&self.role)
    }
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from(e).with_operation(ApiOperation::Register))?;
    let role = payload
        .validate()
        .map_err(|e| e.with_operation(ApiOperation::Register))?;

    let password_hash = state
        .hasher
        .hash(&payload.password)
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Register))?;

    let user = state
        .users
        .create(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Register))?;

    tracing::info!(user_id = user.id, role = role.as_str(), "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let op = ApiOperation::Login;
    let Json(payload) = payload.map_err(|e| ApiError::from(e).with_operation(op))?;
    validate_email(&payload.email).map_err(|e| e.with_operation(op))?;
    validate_password(&payload.password).map_err(|e| e.with_operation(op))?;

    let invalid = || ApiError::new(op, ApiErrorKind::Unauthorized, "Invalid credentials");

    let credentials = state
        .users
        .find_credentials(&payload.email)
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?
        .ok_or_else(invalid)?;

    let matches = state
        .hasher
        .verify(&payload.password, &credentials.password_hash)
        .map_err(|e| ApiError::from(e).with_operation(op))?;
    if !matches {
        tracing::debug!(user_id = credentials.id, "Password mismatch");
        return Err(invalid());
    }

    let token = state
        .tokens
        .generate_token(credentials.id, credentials.role)
        .map_err(|e| ApiError::from(e).with_operation(op))?;
    let user = state
        .users
        .find_by_id(credentials.id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;

    Ok(Json(LoginResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(role: &str, password: &str, email: &str) -> CreateUser {
        CreateUser {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert_eq!(
            payload("teacher", "secret1", "ada@school.test").validate().unwrap(),
            Role::Teacher
        );

        let err = payload("admin", "secret1", "ada@school.test").validate().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::BadRequest);
        assert_eq!(err.message, ROLE_MESSAGE);

        let err = payload("student", "12345", "ada@school.test").validate().unwrap_err();
        assert_eq!(err.message, "Password minimum length of 6 characters");

        assert!(payload("student", "secret1", "not-an-email").validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut create = payload("student", "secret1", "ada@school.test");
        create.name = "   ".to_string();
        assert!(create.validate().is_err());
    }
}
