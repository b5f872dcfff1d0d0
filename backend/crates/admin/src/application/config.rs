//! Application Configuration
//!
//! Configuration for the admin auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Admin auth configuration
#[derive(Debug, Clone)]
pub struct AdminAuthConfig {
    /// OTP lifetime (5 minutes)
    pub otp_ttl: Duration,
    /// Failed verifications allowed per OTP session
    pub otp_max_attempts: i32,
    /// Refresh tokens kept per admin before the set is reset
    pub max_refresh_tokens: i64,
    /// Access token lifetime (1 hour)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub refresh_id_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AdminAuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::from_secs(5 * 60),
            otp_max_attempts: 5,
            max_refresh_tokens: 5,
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_id_cookie_name: "refresh_token_id".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
        }
    }
}

impl AdminAuthConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::default()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn otp_ttl(&self) -> chrono::Duration {
        to_chrono(self.otp_ttl)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        to_chrono(self.refresh_token_ttl)
    }

    /// `access_token` cookie, lives as long as the JWT
    pub fn access_cookie(&self) -> CookieConfig {
        self.cookie(&self.access_cookie_name, self.access_token_ttl)
    }

    /// `refresh_token` cookie
    pub fn refresh_cookie(&self) -> CookieConfig {
        self.cookie(&self.refresh_cookie_name, self.refresh_token_ttl)
    }

    /// `refresh_token_id` cookie
    pub fn refresh_id_cookie(&self) -> CookieConfig {
        self.cookie(&self.refresh_id_cookie_name, self.refresh_token_ttl)
    }

    fn cookie(&self, name: &str, max_age: Duration) -> CookieConfig {
        CookieConfig {
            name: name.to_string(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(max_age.as_secs() as i64),
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(duration.as_secs() as i64)
}
