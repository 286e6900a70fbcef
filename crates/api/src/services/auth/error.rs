//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gallery_core::EmailError),

    /// Registration without a name.
    #[error("Please provide a name")]
    MissingName,

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The current password given for a password change is wrong.
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// A non-admin tried to use the admin login.
    #[error("Not authorized as admin")]
    NotAdmin,

    /// User already exists.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Token could not be signed or verified.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
