//! Error types shared by every repository implementation.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NexusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Username already exists: {username}")]
    DuplicateUsername { username: String },

    #[error("Session token already exists")]
    DuplicateToken,

    #[error("Session expired at {expired_at}")]
    SessionExpired { expired_at: DateTime<Utc> },

    #[error("Session revoked at {revoked_at}")]
    SessionRevoked { revoked_at: DateTime<Utc> },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NexusResult<T> = Result<T, NexusError>;

impl NexusError {
    /// Shorthand for a `NotFound` on a session looked up by token.
    ///
    /// Only a short prefix of the token is kept so that error messages
    /// never carry a usable credential.
    pub fn session_not_found(token: &str) -> Self {
        let prefix: String = token.chars().take(8).collect();
        NexusError::NotFound {
            entity: "session".into(),
            id: format!("token={prefix}…"),
        }
    }
}
