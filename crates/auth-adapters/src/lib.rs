//! # auth-adapters
//!
//! Implementations of `AuthProvider`. Password hashing is always built;
//! bearer tokens need the `auth-jwt` feature.

mod password;

#[cfg(feature = "auth-jwt")]
mod jwt;

use domains::AppError;
use thiserror::Error;

pub use password::Argon2Hasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtAuthProvider;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("Not authorized, token failed")]
    InvalidToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => AppError::Unauthorized(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
