//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and must be safe to call from
//! many tasks at once. Uniqueness races are left to the storage engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::NexusResult;
use crate::models::{
    session::{CreateSession, Session},
    user::{CreateUser, User},
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with `DuplicateUsername` when the username is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = NexusResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = NexusResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = NexusResult<User>> + Send;
    /// Set `last_seen`. Fails with `NotFound` when no row was affected.
    fn update_last_seen(
        &self,
        id: Uuid,
        last_seen: DateTime<Utc>,
    ) -> impl Future<Output = NexusResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = NexusResult<Session>> + Send;
    /// Look up a live session.
    ///
    /// `NotFound`, `SessionRevoked` and `SessionExpired` are distinct
    /// outcomes; only an issued, unexpired session is returned.
    fn get_by_token(&self, token: &str) -> impl Future<Output = NexusResult<Session>> + Send;
    /// Mark a session revoked. Revoking twice is a no-op.
    fn revoke(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> impl Future<Output = NexusResult<()>> + Send;
}
