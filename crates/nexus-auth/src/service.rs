//! Authentication service — registration, login, session validation
//! and logout orchestration.

use std::sync::OnceLock;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::models::session::{self, CreateSession};
use nexus_core::models::user::CreateUser;
use nexus_core::repository::{SessionRepository, UserRepository};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, CryptoError};
use crate::password;
use crate::token;

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Opaque bearer token (64 hex chars).
    pub token: String,
    /// Session lifetime in seconds.
    pub expires_in: u64,
    pub session_id: Uuid,
    pub user_id: Uuid,
}

/// A session that was live at validation time.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl ValidatedSession {
    /// Whole seconds of validity left at `now`, clamped at zero.
    pub fn expires_in(&self, now: DateTime<Utc>) -> u64 {
        session::seconds_until(self.expires_at, now)
    }
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    user_repo: U,
    session_repo: S,
    config: AuthConfig,
    /// Hash verified against when the username is unknown, so that
    /// path costs the same as a wrong password.
    dummy_hash: OnceLock<String>,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a new account. Returns the new user's id.
    ///
    /// Registration does not authenticate; callers log in afterwards.
    pub async fn register(&self, input: RegisterInput) -> Result<Uuid, AuthError> {
        self.check_credentials_shape(&input.username, &input.password)?;

        let password_hash = self.hash(input.password).await?;
        let now = Utc::now();
        let id = Uuid::new_v4();

        let user = self
            .bounded(
                "user.create",
                self.user_repo.create(CreateUser {
                    id,
                    username: input.username.clone(),
                    password_hash,
                    created_at: Some(now),
                    last_seen: Some(now),
                }),
            )
            .await
            .map_err(|e| match e {
                NexusError::DuplicateUsername { username } => {
                    info!(%username, "Registration rejected: username taken");
                    AuthError::DuplicateUsername
                }
                other => internal("user.create", other),
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user.id)
    }

    /// Authenticate with username + password and issue a session.
    ///
    /// An unknown username and a wrong password produce the same
    /// `InvalidCredentials` outcome.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        self.check_credentials_shape(&input.username, &input.password)?;

        // 1. Look up user.
        let user = match self
            .bounded(
                "user.get_by_username",
                self.user_repo.get_by_username(&input.username),
            )
            .await
        {
            Ok(u) => u,
            Err(NexusError::NotFound { .. }) => {
                self.dummy_verify(input.password).await;
                debug!(username = %input.username, "Login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(internal("user.get_by_username", e)),
        };

        // 2. Verify password.
        if !self.verify(input.password, user.password_hash).await? {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // 3. Issue token and persist the session.
        let token = token::issue_session_token().map_err(|e| {
            error!(error = %e, "Token issuance failed");
            AuthError::from(e)
        })?;
        let now = Utc::now();
        let ttl = self.config.session_ttl_secs;
        let expires_at = now + Duration::seconds(ttl as i64);

        let session = self
            .bounded(
                "session.create",
                self.session_repo.create(CreateSession {
                    user_id: user.id,
                    token: token.clone(),
                    created_at: Some(now),
                    expires_at,
                }),
            )
            .await
            .map_err(|e| internal("session.create", e))?;

        info!(user_id = %user.id, session_id = %session.id, "User logged in");
        Ok(LoginOutput {
            token,
            expires_in: ttl,
            session_id: session.id,
            user_id: user.id,
        })
    }

    /// Resolve a bearer token to a live session and record activity.
    pub async fn validate_session(&self, token: &str) -> Result<ValidatedSession, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidSession);
        }

        let session = self
            .bounded("session.get_by_token", self.session_repo.get_by_token(token))
            .await
            .map_err(|e| match e {
                NexusError::NotFound { .. } => {
                    debug!("Session rejected: unknown token");
                    AuthError::InvalidSession
                }
                NexusError::SessionExpired { expired_at } => {
                    debug!(%expired_at, "Session rejected: expired");
                    AuthError::InvalidSession
                }
                NexusError::SessionRevoked { revoked_at } => {
                    debug!(%revoked_at, "Session rejected: revoked");
                    AuthError::InvalidSession
                }
                other => internal("session.get_by_token", other),
            })?;

        if let Err(e) = self
            .bounded(
                "user.update_last_seen",
                self.user_repo.update_last_seen(session.user_id, Utc::now()),
            )
            .await
        {
            warn!(user_id = %session.user_id, error = %e, "Failed to update last_seen");
        }

        Ok(ValidatedSession {
            session_id: session.id,
            user_id: session.user_id,
            expires_at: session.expires_at,
        })
    }

    /// Revoke the session behind `token`. Revoking twice succeeds.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidSession);
        }

        self.bounded("session.revoke", self.session_repo.revoke(token, Utc::now()))
            .await
            .map_err(|e| match e {
                NexusError::NotFound { .. } => AuthError::InvalidSession,
                other => internal("session.revoke", other),
            })?;

        info!("Session revoked");
        Ok(())
    }

    fn check_credentials_shape(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() {
            return Err(AuthError::InvalidInput("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".into()));
        }
        if username.chars().count() > self.config.max_username_length {
            return Err(AuthError::InvalidInput(format!(
                "username must be at most {} characters",
                self.config.max_username_length
            )));
        }
        if password.len() > self.config.max_password_length {
            return Err(AuthError::InvalidInput(format!(
                "password must be at most {} bytes",
                self.config.max_password_length
            )));
        }
        Ok(())
    }

    /// Run a repository call under the storage deadline.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = NexusResult<T>>,
    ) -> NexusResult<T> {
        let limit = StdDuration::from_secs(self.config.storage_timeout_secs);
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(NexusError::Internal(format!(
                "{operation} timed out after {}s",
                self.config.storage_timeout_secs
            ))),
        }
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let params = self.config.password_hash;
        let pepper = self.config.pepper.clone();
        let result = tokio::task::spawn_blocking(move || {
            password::hash_password(&password, &params, pepper.as_deref())
        })
        .await
        .map_err(|e| CryptoError::Hashing(format!("hashing task failed: {e}")))
        .and_then(|r| r);

        result.map_err(|e| {
            error!(error = %e, "Password hashing failed");
            AuthError::from(e)
        })
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || {
            password::verify_password(&password, &hash, pepper.as_deref())
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Password verification task failed");
            AuthError::Internal(format!("verification task failed: {e}"))
        })
    }

    /// Spend one verification on a throwaway hash.
    async fn dummy_verify(&self, password: String) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash.clone(),
            None => match self.hash(Uuid::new_v4().to_string()).await {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash).clone(),
                Err(e) => {
                    debug!(error = %e, "Dummy hash unavailable");
                    return;
                }
            },
        };
        if let Err(e) = self.verify(password, hash).await {
            debug!(error = %e, "Dummy password verification failed");
        }
    }
}

/// Log a storage failure with detail and collapse it to `Internal`.
fn internal(operation: &'static str, err: NexusError) -> AuthError {
    error!(operation, error = %err, "Storage failure");
    AuthError::Internal(format!("{operation}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_in_counts_down_and_clamps() {
        let now = Utc::now();
        let validated = ValidatedSession {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: now + Duration::seconds(90),
        };
        assert_eq!(validated.expires_in(now), 90);
        assert_eq!(validated.expires_in(now + Duration::seconds(90)), 0);
        assert_eq!(validated.expires_in(now + Duration::hours(1)), 0);
    }
}
