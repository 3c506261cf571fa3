//! # AppError
//!
//! Centralized error handling for Hushbox.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// Why a submission was refused. Every variant is recoverable by editing the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your confession")]
    Empty,

    #[error("Your confession contains potentially unsafe content")]
    UnsafeContent,

    #[error("Confession is too long (max {max} characters)")]
    TooLong { max: usize },

    #[error("Your confession contains a forbidden term")]
    ForbiddenTerm,
}

impl ValidationError {
    /// Short machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::Empty => "empty",
            ValidationError::UnsafeContent => "unsafe content",
            ValidationError::TooLong { .. } => "too long",
            ValidationError::ForbiddenTerm => "forbidden term",
        }
    }
}

/// Authentication and authorization failures. All of them fail closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Invalid role")]
    InvalidRole,

    #[error("Unauthorized: role missing")]
    ExternalRoleMissing,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    /// `true` when the caller is known but lacks a role (403), `false` when
    /// the caller could not be identified at all (401).
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::InvalidRole | AuthError::ExternalRoleMissing)
    }
}

/// The primary error type for all hb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Confession, archive entry)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Submission refused by the validator
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session or credential failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed request payload (e.g., missing IP on ban)
    #[error("{0}")]
    BadRequest(String),

    /// Submitting IP is on the ban list
    #[error("You are banned.")]
    Banned,

    /// Infrastructure failure (e.g., DB down, signing failure)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Hushbox logic.
pub type Result<T> = std::result::Result<T, AppError>;
