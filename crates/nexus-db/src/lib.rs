//! Nexus Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `nexus-core` repository traits
//!   ([`repository`])

mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager, health_check};
pub use error::DbError;
pub use schema::{SESSION_TOKEN_INDEX, USERNAME_INDEX, latest_version, run_migrations};
