//! Opaque session token generation.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Generate a session bearer token: 32 bytes from the OS CSPRNG,
/// hex-encoded to 64 lowercase characters.
///
/// There is no fallback source; a failing OS generator fails the call.
pub fn issue_session_token() -> Result<String, CryptoError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}
