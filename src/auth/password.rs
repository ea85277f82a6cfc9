use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password is required")]
    Missing,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    TooShort,

    /// The stored hash is unreadable or argon2 refused to hash.
    #[error("argon2: {0}")]
    Argon(String),
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Missing | PasswordError::TooShort => AppError::Validation(e.to_string()),
            PasswordError::Argon(_) => AppError::Internal(e.into()),
        }
    }
}

/// Plain text that passed the strength rules; only these get hashed for
/// new accounts and password changes.
#[derive(Clone)]
pub struct NewPassword(String);

impl NewPassword {
    pub fn parse(plain: &str) -> Result<Self, PasswordError> {
        if plain.is_empty() {
            return Err(PasswordError::Missing);
        }
        if plain.chars().count() < MIN_PASSWORD_LEN {
            return Err(PasswordError::TooShort);
        }
        Ok(Self(plain.to_string()))
    }

    /// PHC string with a fresh random salt.
    pub fn hash(&self) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Argon(e.to_string())
            })
    }
}

impl std::fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NewPassword(***)")
    }
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        PasswordError::Argon(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
