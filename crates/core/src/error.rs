//! Domain error model.

use std::fmt::Display;

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Business rule failures raised by the marketplace modules.
///
/// Storage and transport failures are not represented here; the API layer
/// maps each variant onto a status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record is in a state that does not allow the operation
    /// (confirming a cancelled reservation, reviewing an unconfirmed stay).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate records and overlapping stays.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but not the owner, host or guest the operation needs.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `"<field> must be between <min> and <max>"`
    pub fn out_of_range(field: &str, min: impl Display, max: impl Display) -> Self {
        Self::Validation(format!("{field} must be between {min} and {max}"))
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
