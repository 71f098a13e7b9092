//! Identity hashing: raw sender identifiers (phone numbers) never leave
//! this module. Everything downstream sees only an `IdentityToken`.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SecretSalt;

/// Length of a token: hex-encoded SHA-256.
pub const TOKEN_HEX_LEN: usize = 64;

/// Irreversible per-identity token stored in place of the raw identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Wrap a token read back from storage.
    pub fn from_stored(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines. Never log the full token.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash `identifier || salt` with SHA-256 and hex-encode the digest.
///
/// Pure: the same identifier and salt always give the same token.
pub fn hash_identifier(identifier: &str, salt: &SecretSalt) -> IdentityToken {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(salt.expose().as_bytes());
    let digest = hasher.finalize();
    IdentityToken(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Locally generated identifier for submissions that arrive without one.
///
/// Combines wall-clock nanoseconds with random bits so two anonymous
/// submissions never share a token, even within the same second.
pub fn ephemeral_identifier() -> String {
    let now = chrono::Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros());
    let nonce: u64 = rand::random();
    format!("ephemeral-{nanos}-{nonce:016x}")
}

/// Token for an optional raw identifier. Blank identifiers get an
/// ephemeral one first; the hashing step itself stays pure.
pub fn token_for(identifier: Option<&str>, salt: &SecretSalt) -> IdentityToken {
    match identifier.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => hash_identifier(id, salt),
        None => hash_identifier(&ephemeral_identifier(), salt),
    }
}
