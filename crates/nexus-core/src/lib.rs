//! Nexus Core — domain models, error types and repository contracts
//! for the authentication and session core.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{NexusError, NexusResult};
