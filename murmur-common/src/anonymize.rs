//! Identity anonymization
//!
//! Respondents are never stored under their chat-platform user id.
//! Instead every id is mapped through a keyed one-way hash:
//!
//! ```text
//! token = hex(SHA-256(salt || ":" || platform_user_id))
//! ```
//!
//! The salt is operator-configured and never persisted next to the
//! tokens, so a database dump alone cannot be joined back to platform
//! identities. For the same salt the mapping is deterministic across
//! restarts, which is what keeps a respondent's profile and sessions
//! attached to them.

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Keyed one-way mapping from platform user ids to anonymous tokens
#[derive(Debug, Clone)]
pub struct Anonymizer {
    salt: String,
}

impl Anonymizer {
    /// Create an anonymizer from a configured salt.
    ///
    /// Fails with `Error::Config` when the salt is missing or empty.
    /// Callers treat this as fatal at startup: running without a salt
    /// would either crash on first contact or silently degrade the
    /// anonymity guarantee.
    pub fn new(salt: impl Into<String>) -> Result<Self> {
        let salt = salt.into();
        if salt.is_empty() {
            return Err(Error::Config(
                "anonymizer salt is not set (MURMUR_ANONYMOUS_SALT)".to_string(),
            ));
        }
        Ok(Self { salt })
    }

    /// Derive the anonymous token for a platform user id.
    ///
    /// Returns 64 lowercase hex characters (SHA-256).
    pub fn token(&self, platform_user_id: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(b":");
        hasher.update(platform_user_id.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
