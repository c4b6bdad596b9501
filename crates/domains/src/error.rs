//! # AppError
//!
//! Centralized error handling for the StackIt ecosystem.
//! Inbound adapters map these to HTTP responses; store adapters map their
//! backend failures into them.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Question, Answer, Notification)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller is not the owner (or an admin) for a mutating action,
    /// or presented no valid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed or missing fields
    #[error("{0}")]
    ValidationError(String),

    /// A referenced parent entity is missing (e.g., the question of an answer)
    #[error("{0} not found")]
    ReferentialError(&'static str),

    /// Compare-and-swap lost against a concurrent write
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for StackIt logic.
pub type Result<T> = std::result::Result<T, AppError>;
