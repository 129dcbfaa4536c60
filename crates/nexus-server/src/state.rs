use std::sync::Arc;

use nexus_auth::AuthService;
use nexus_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::config::ServerConfig;

pub type Auth = AuthService<SurrealUserRepository<Any>, SurrealSessionRepository<Any>>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    /// Raw engine handle, used by the health check.
    pub db: Surreal<Any>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the repositories and auth service around one engine handle.
    pub fn new(db: Surreal<Any>, config: ServerConfig) -> Self {
        let auth = AuthService::new(
            SurrealUserRepository::new(db.clone()),
            SurrealSessionRepository::new(db.clone()),
            config.auth.clone(),
        );
        Self {
            auth: Arc::new(auth),
            db,
            config: Arc::new(config),
        }
    }
}
