//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::models::session::{CreateSession, Session, SessionState};
use nexus_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::CONFLICT_ATTEMPTS;
use crate::error::DbError;
use crate::schema::SESSION_TOKEN_INDEX;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    user_id: String,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

fn row_to_session(row: SessionRow, id: Uuid) -> Result<Session, DbError> {
    let user_id = Uuid::parse_str(&row.user_id)
        .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
    Ok(Session {
        id,
        user_id,
        token: row.token,
        created_at: row.created_at,
        expires_at: row.expires_at,
        revoked_at: row.revoked_at,
    })
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        row_to_session(
            SessionRow {
                user_id: self.user_id,
                token: self.token,
                created_at: self.created_at,
                expires_at: self.expires_at,
                revoked_at: self.revoked_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn insert(&self, input: &CreateSession) -> Result<Session, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 token = $session_token, \
                 created_at = $created_at, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("session_token", input.token.clone()))
            .bind(("created_at", created_at))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(|e| DbError::from_statement(e, &[SESSION_TOKEN_INDEX]))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, &[SESSION_TOKEN_INDEX]))?;

        let rows: Vec<SessionRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row_to_session(row, id)
    }

    /// Fetch the raw row for `token` regardless of its state.
    async fn find_by_token(&self, token: &str) -> NexusResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token = $session_token",
            )
            .bind(("session_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| NexusError::session_not_found(token))?;

        Ok(row.try_into_session()?)
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> NexusResult<Session> {
        let mut attempt = 1;
        loop {
            match self.insert(&input).await {
                Ok(session) => {
                    debug!(
                        session_id = %session.id,
                        user_id = %input.user_id,
                        "Session row inserted"
                    );
                    return Ok(session);
                }
                Err(DbError::UniqueViolation { .. }) => return Err(NexusError::DuplicateToken),
                Err(DbError::Conflict(_)) if attempt < CONFLICT_ATTEMPTS => {
                    debug!(attempt, "Session insert hit a write conflict, retrying");
                    attempt += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    async fn get_by_token(&self, token: &str) -> NexusResult<Session> {
        let session = self.find_by_token(token).await?;

        match session.state_at(Utc::now()) {
            SessionState::Issued => Ok(session),
            SessionState::Expired => Err(NexusError::SessionExpired {
                expired_at: session.expires_at,
            }),
            SessionState::Revoked => Err(NexusError::SessionRevoked {
                // state_at only reports Revoked when revoked_at is set
                revoked_at: session.revoked_at.unwrap_or(session.created_at),
            }),
        }
    }

    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> NexusResult<()> {
        let result = self
            .db
            .query(
                "UPDATE session SET revoked_at = $revoked_at \
                 WHERE token = $session_token AND revoked_at = NONE",
            )
            .bind(("session_token", token.to_string()))
            .bind(("revoked_at", revoked_at))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            // Either unknown or already revoked; only the former is an error.
            self.find_by_token(token).await?;
        }

        Ok(())
    }
}
