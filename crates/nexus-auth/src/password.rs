//! Password hashing and verification using Argon2id.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::{debug, warn};

use crate::config::HashParams;
use crate::error::CryptoError;

const SALT_LEN: usize = 16;

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext password into an Argon2id PHC string.
///
/// If `pepper` is provided it is prepended to the password; the same
/// pepper must be passed to [`verify_password`].
pub fn hash_password(
    password: &str,
    params: &HashParams,
    pepper: Option<&str>,
) -> Result<String, CryptoError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CryptoError::Hashing(format!("salt encoding: {e}")))?;

    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        None,
    )
    .map_err(|e| CryptoError::Hashing(format!("invalid parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);
    argon2
        .hash_password(input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::Hashing(e.to_string()))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `false` on mismatch and on a malformed stored hash. The
/// work factor is read from the stored hash.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);
    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => {
            debug!("Password mismatch");
            false
        }
        Err(e) => {
            warn!(error = %e, "Password verification failed");
            false
        }
    }
}
