//! Password hashing using Argon2id
//!
//! Hashes are stored in PHC string format, so verification reads the
//! parameters back from the hash itself.
//!
//! # Example
//!
//! ```rust
//! use classroom_service::auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("open sesame").unwrap();
//! assert!(hasher.verify("open sesame", &hash).unwrap());
//! assert!(!hasher.verify("open barley", &hash).unwrap());
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::Error;

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordHasher {
    /// Hasher with explicit Argon2 cost parameters
    pub fn new(memory_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self, Error> {
        let params = Params::new(memory_cost_kib, time_cost, parallelism, None)
            .map_err(|e| Error::Auth(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self {
            params,
            min_password_length: MIN_PASSWORD_LENGTH,
        })
    }

    /// Check the password policy without hashing
    pub fn validate(&self, password: &str) -> Result<(), Error> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::ValidationError(format!(
                "Password minimum length of {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }

    /// Hash a password into PHC string format
    ///
    /// Fails with `ValidationError` when the password is shorter than the
    /// minimum length.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        self.validate(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash in constant time
    ///
    /// Returns `Ok(false)` on mismatch and an error only when the stored hash
    /// cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Auth(format!("Invalid password hash format: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Auth(format!("Password verification failed: {}", e))),
        }
    }
}
