//! OTP Code Value Object
//!
//! Six-digit numeric one-time passcode mailed to the admin at login.

use std::fmt;

use platform::password::SecretHash;
use rand::Rng;

use crate::error::{AdminError, AdminResult};

/// Number of digits in a code
pub const OTP_LENGTH: usize = 6;

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// One-time passcode
///
/// Debug output is redacted; use [`OtpCode::as_str`] to put it in the mail.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generate a fresh code, uniform in 100000..=999999
    pub fn generate() -> Self {
        let value = rand::rng().random_range(OTP_MIN..=OTP_MAX);
        Self(value.to_string())
    }

    /// Parse a submitted code
    ///
    /// Any six ASCII digits are accepted (including a leading zero), so a
    /// wrong guess still counts as an attempt instead of a validation error.
    pub fn parse(input: &str) -> AdminResult<Self> {
        let trimmed = input.trim();

        if trimmed.len() != OTP_LENGTH || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AdminError::Validation(format!(
                "OTP must be exactly {OTP_LENGTH} digits"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash for storage
    pub fn hash(&self) -> AdminResult<SecretHash> {
        Ok(SecretHash::digest(self.0.as_bytes(), None)?)
    }

    /// Compare against a stored hash
    pub fn matches(&self, hash: &SecretHash) -> bool {
        hash.verify_bytes(self.0.as_bytes(), None)
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}
