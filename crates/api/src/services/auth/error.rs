//! Authentication error type.

use thiserror::Error;

use protech_core::EmailError;

use crate::db::RepositoryError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is wrong. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already registered")]
    UserAlreadyExists,

    /// Password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Email address is structurally invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Bearer token is missing, malformed, expired, or mis-signed.
    #[error("invalid token")]
    InvalidToken,

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    TokenIssue(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Underlying repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
