//! OTP Session Entity
//!
//! One in-flight two-factor challenge. At most one row per admin
//! (`admin_sessions.admin_id` is unique).

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AdminId, OtpSessionId};
use platform::password::SecretHash;

/// OTP session entity
#[derive(Debug, Clone)]
pub struct OtpSession {
    /// Opaque lookup key handed to the client
    pub id: OtpSessionId,
    pub admin_id: AdminId,
    pub otp_hash: SecretHash,
    pub expires_at: DateTime<Utc>,
    /// Failed verifications so far
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a session stands when a verification arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpSessionState {
    Live,
    Expired,
    AttemptsExhausted,
}

impl OtpSession {
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(admin_id: AdminId, otp_hash: SecretHash, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: OtpSessionId::new(),
            admin_id,
            otp_hash,
            expires_at: now + ttl,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Expiry wins over the attempt counter
    pub fn state(&self, now: DateTime<Utc>, max_attempts: i32) -> OtpSessionState {
        if self.is_expired_at(now) {
            OtpSessionState::Expired
        } else if self.attempts >= max_attempts {
            OtpSessionState::AttemptsExhausted
        } else {
            OtpSessionState::Live
        }
    }
}
