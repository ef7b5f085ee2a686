//! JWT token generation
//!
//! Generates HS256 tokens that [`JwtAuth`](crate::middleware::JwtAuth)
//! validates with the same secret.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::config::JwtConfig;
use crate::error::Error;
use crate::middleware::Claims;
use crate::models::Role;

use super::TokenGenerator;

/// JWT token generator
#[derive(Clone)]
pub struct JwtGenerator {
    encoding_key: Arc<EncodingKey>,
    lifetime: Duration,
    issuer: Option<String>,
}

impl JwtGenerator {
    /// Create a generator from the JWT configuration
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        if config.secret.is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(
                "jwt.secret must not be empty".to_string(),
            ))));
        }
        let hours = u64::try_from(config.expires_in_hours).map_err(|_| {
            Error::Config(Box::new(figment::Error::from(format!(
                "jwt.expires_in_hours must be positive, got {}",
                config.expires_in_hours
            ))))
        })?;

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            lifetime: Duration::from_secs(hours * 3600),
            issuer: config.issuer.clone(),
        })
    }

    fn generate_internal(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| Error::Jwt(Box::new(e)))
    }
}

impl TokenGenerator for JwtGenerator {
    fn generate_token(&self, user_id: i64, role: Role) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: now.saturating_add(lifetime),
            iat: Some(now),
            iss: self.issuer.clone(),
        };
        self.generate_internal(&claims)
    }

    fn default_lifetime(&self) -> Duration {
        self.lifetime
    }
}
