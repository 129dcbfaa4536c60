//! SurrealDB repository implementations.

/// Attempts made when the engine aborts an insert on a write conflict.
const CONFLICT_ATTEMPTS: u32 = 5;

mod session;
mod user;

pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;
