//! Authentication error types.

use thiserror::Error;

/// Caller-facing outcome of an authentication operation.
///
/// Storage errors are classified inside the service and never cross
/// this boundary unchanged.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("username already taken")]
    DuplicateUsername,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired session")]
    InvalidSession,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures of the password hasher and token issuer.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
