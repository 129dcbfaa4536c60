//! SurrealDB implementation of [`UserRepository`].
//!
//! Passwords arrive already hashed; this module only stores and reads
//! the PHC string.

use chrono::{DateTime, Utc};
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::models::user::{CreateUser, User};
use nexus_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::CONFLICT_ATTEMPTS;
use crate::error::DbError;
use crate::schema::USERNAME_INDEX;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_seen: Option<DateTime<Utc>>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_seen: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            created_at: self.created_at,
            last_seen: self.last_seen,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            created_at: self.created_at,
            last_seen: self.last_seen,
        })
    }
}

fn duplicate(username: &str) -> NexusError {
    NexusError::DuplicateUsername {
        username: username.to_string(),
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn insert(&self, input: &CreateUser) -> Result<User, DbError> {
        let id_str = input.id.to_string();
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, \
                 password_hash = $password_hash, \
                 created_at = $created_at, \
                 last_seen = $last_seen",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username.clone()))
            .bind(("password_hash", input.password_hash.clone()))
            .bind(("created_at", created_at))
            .bind(("last_seen", input.last_seen))
            .await
            .map_err(|e| DbError::from_statement(e, &[USERNAME_INDEX]))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, &[USERNAME_INDEX]))?;

        let rows: Vec<UserRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(input.id))
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> NexusResult<User> {
        let mut attempt = 1;
        loop {
            match self.insert(&input).await {
                Ok(user) => {
                    debug!(user_id = %user.id, "User row inserted");
                    return Ok(user);
                }
                Err(DbError::UniqueViolation { .. }) => return Err(duplicate(&input.username)),
                Err(DbError::Conflict(msg)) => {
                    // A racing insert may have committed the same username.
                    match self.get_by_username(&input.username).await {
                        Ok(_) => return Err(duplicate(&input.username)),
                        Err(NexusError::NotFound { .. }) if attempt < CONFLICT_ATTEMPTS => {
                            debug!(attempt, "User insert hit a write conflict, retrying");
                            attempt += 1;
                        }
                        Err(NexusError::NotFound { .. }) => {
                            return Err(DbError::Conflict(msg).into());
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> NexusResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_username(&self, username: &str) -> NexusResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update_last_seen(&self, id: Uuid, last_seen: DateTime<Utc>) -> NexusResult<()> {
        let id_str = id.to_string();

        // UPDATE on a record id never creates it; an unknown id simply
        // returns no rows.
        let result = self
            .db
            .query("UPDATE type::record('user', $id) SET last_seen = $last_seen")
            .bind(("id", id_str.clone()))
            .bind(("last_seen", last_seen))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
