//! Password reset tokens
//!
//! The plain token is handed to the user once; only its SHA-256 digest and an
//! expiry are kept on the record.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lifetime of a reset token
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Stored half of a reset token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetToken {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Generate a token. Returns the plain value and what should be stored.
    pub fn generate(now: DateTime<Utc>) -> (String, Self) {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plain: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();

        let stored = Self {
            token_hash: digest(&plain),
            expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        };

        (plain, stored)
    }

    pub fn matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        if self.expires_at < now {
            return false;
        }
        self.token_hash == digest(candidate)
    }
}

fn digest(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}
