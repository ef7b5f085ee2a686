//! User accounts

use sqlx::SqlitePool;

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, SqlxResultExt};
use super::traits::RepositoryResult;
use crate::models::{Role, User, UserCredentials};

/// Account to create; `password_hash` is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// User store
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account; a taken email fails with `AlreadyExists`
    pub async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?) \
             RETURNING id, name, email, role",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .during(RepositoryOperation::Create)
        .map_err(|e| match e.kind {
            RepositoryErrorKind::AlreadyExists => RepositoryError::already_exists("User", &user.email),
            _ => e,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .during(RepositoryOperation::FindById)?
            .ok_or_else(|| RepositoryError::not_found("User", id.to_string()))
    }

    /// Login material for `email`, if an account exists
    pub async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>("SELECT id, role, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .during(RepositoryOperation::FindOne)
    }

    /// Every user with `role`, oldest first
    pub async fn find_by_role(&self, role: Role) -> RepositoryResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE role = ? ORDER BY id")
            .bind(role)
            .fetch_all(&self.pool)
            .await
            .during(RepositoryOperation::FindAll)
    }
}
