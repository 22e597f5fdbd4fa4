//! Authentication error types.

use thiserror::Error;

use punchcard_core::UsernameError;

use crate::db::RepositoryError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username failed validation.
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),

    /// Passcode failed validation.
    #[error("{0}")]
    WeakPasscode(String),

    /// A case-insensitively equal username is already registered.
    #[error("that username is already taken")]
    UsernameTaken,

    /// Wrong username or wrong passcode.
    ///
    /// Deliberately one variant for both, so login responses cannot be used
    /// to probe which usernames exist.
    #[error("invalid username or passcode")]
    InvalidCredentials,

    /// Underlying store failure.
    #[error(transparent)]
    Repository(RepositoryError),

    /// Passcode hashing failed.
    #[error("failed to hash passcode")]
    PasscodeHash,
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::UsernameTaken,
            other => Self::Repository(other),
        }
    }
}
