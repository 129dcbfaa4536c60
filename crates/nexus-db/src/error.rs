//! Database-specific error types and conversions.

use nexus_core::error::NexusError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique index {index} violated")]
    UniqueViolation { index: &'static str },

    /// The engine aborted the transaction because a concurrent one wrote
    /// the same keys. Safe to retry.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement.
    ///
    /// SurrealDB reports unique-index violations as a plain statement
    /// error naming the index (``Database index `idx_user_username`
    /// already contains ...``). When the message names one of `indexes`
    /// the error becomes `UniqueViolation`; a concurrent-write abort is
    /// `Conflict`; anything else is `Query`.
    pub fn from_statement(err: surrealdb::Error, indexes: &[&'static str]) -> Self {
        Self::classify_message(err.to_string(), indexes)
    }

    fn classify_message(msg: String, indexes: &[&'static str]) -> Self {
        if let Some(index) = indexes.iter().copied().find(|index| msg.contains(*index)) {
            DbError::UniqueViolation { index }
        } else if CONFLICT_MARKERS.iter().any(|marker| msg.contains(*marker)) {
            DbError::Conflict(msg)
        } else {
            DbError::Query(msg)
        }
    }
}

/// Fragments of the engine's write-conflict messages
/// (``Transaction conflict: Write conflict, retry the transaction``).
const CONFLICT_MARKERS: &[&str] = &["Transaction conflict", "Write conflict"];

impl From<DbError> for NexusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => NexusError::NotFound { entity, id },
            other => NexusError::Storage(other.to_string()),
        }
    }
}
