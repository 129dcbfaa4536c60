//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub token: String,
    /// Defaults to the insertion time when `None`.
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Authorization state of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Issued,
    Expired,
    Revoked,
}

impl Session {
    /// Evaluate the session at `now`.
    ///
    /// A session is `Issued` only while `now < expires_at`. Revocation
    /// takes precedence over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if now >= self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Issued
        }
    }

    /// Whole seconds of validity left at `now`, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        seconds_until(self.expires_at, now)
    }
}

/// Whole seconds from `now` until `expires_at`, clamped at zero.
pub fn seconds_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (expires_at - now).num_seconds().max(0) as u64
}
