//! Nexus Auth — password hashing, session token issuance, and the
//! register/login/session protocol.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, HashParams};
pub use error::{AuthError, CryptoError};
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput, ValidatedSession};
