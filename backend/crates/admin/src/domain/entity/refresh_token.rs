//! Refresh Token Entity
//!
//! One device grant. Only the Argon2id hash of the token material is kept;
//! the plaintext leaves the server exactly once, in the verify-otp response.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AdminId, RefreshTokenId};
use platform::password::SecretHash;

/// Refresh token record
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Returned to the client as the `refresh_token_id` cookie
    pub id: RefreshTokenId,
    pub admin_id: AdminId,
    pub token_hash: SecretHash,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(admin_id: AdminId, token_hash: SecretHash, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: RefreshTokenId::new(),
            admin_id,
            token_hash,
            expires_at: now + ttl,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches(&self, token: &str) -> bool {
        self.token_hash.verify_bytes(token.as_bytes(), None)
    }
}
