//! Server configuration loaded from environment variables.

use std::str::FromStr;

use anyhow::Context;
use nexus_auth::AuthConfig;
use nexus_db::DbConfig;

/// Server configuration.
///
/// All fields have defaults suitable for local development against the
/// embedded in-memory engine.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout_secs: 30,
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `8080`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `DATABASE_URL`         | `mem://`  |
    /// | `DATABASE_NAMESPACE`   | `nexus`   |
    /// | `DATABASE_NAME`        | `main`    |
    /// | `DATABASE_USER`        | unset     |
    /// | `DATABASE_PASSWORD`    | unset     |
    /// | `SESSION_TTL_SECS`     | `86400`   |
    /// | `PASSWORD_PEPPER`      | unset     |
    /// | `STORAGE_TIMEOUT_SECS` | `5`       |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let db = DbConfig {
            url: lookup("DATABASE_URL").unwrap_or(defaults.db.url),
            namespace: lookup("DATABASE_NAMESPACE").unwrap_or(defaults.db.namespace),
            database: lookup("DATABASE_NAME").unwrap_or(defaults.db.database),
            username: lookup("DATABASE_USER"),
            password: lookup("DATABASE_PASSWORD"),
        };

        let auth = AuthConfig {
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", defaults.auth.session_ttl_secs)?,
            pepper: lookup("PASSWORD_PEPPER").filter(|p| !p.is_empty()),
            storage_timeout_secs: parse_or(
                &lookup,
                "STORAGE_TIMEOUT_SECS",
                defaults.auth.storage_timeout_secs,
            )?,
            ..defaults.auth
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            db,
            auth,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}
