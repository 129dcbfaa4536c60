//! Authentication configuration.

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB (default: 19_456 = 19 MiB).
    pub memory_kib: u32,
    /// Number of passes (default: 2).
    pub iterations: u32,
    /// Degree of parallelism (default: 1).
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session lifetime in seconds (default: 86_400 = 24 hours).
    pub session_ttl_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// Work factor applied to newly hashed passwords.
    pub password_hash: HashParams,
    /// Maximum username length in characters (default: 255).
    pub max_username_length: usize,
    /// Maximum password length in bytes (default: 1024).
    pub max_password_length: usize,
    /// Deadline for a single repository call in seconds (default: 5).
    pub storage_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 86_400,
            pepper: None,
            password_hash: HashParams::default(),
            max_username_length: 255,
            max_password_length: 1024,
            storage_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl_secs, 86_400);
        assert!(config.pepper.is_none());
        assert_eq!(config.password_hash.memory_kib, 19_456);
        assert_eq!(config.password_hash.iterations, 2);
        assert_eq!(config.password_hash.parallelism, 1);
        assert_eq!(config.storage_timeout_secs, 5);
    }
}
