//! Token Service
//!
//! Stateless minting and verification of HS256 access tokens, plus opaque
//! refresh-token material. Holds nothing but the signing key.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::AdminId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entity::admin::Admin;
use crate::domain::value_object::admin_role::AdminRole;

/// Prefix carried by the `access_token` cookie and response field
pub const BEARER_PREFIX: &str = "Bearer ";

/// Environment variable holding the signing secret
pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";

/// Random bytes in the second half of a refresh token
const REFRESH_TOKEN_RANDOM_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT_SECRET_KEY is not configured")]
    MissingSecret,

    /// Bad signature, malformed or expired; deliberately not distinguished
    #[error("Invalid or expired access token")]
    Invalid,

    #[error("Failed to sign access token: {0}")]
    Signing(String),
}

/// Access token claims, also the request-scoped principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub id: AdminId,
    pub role: AdminRole,
    pub first_name: String,
    pub last_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Freshly minted pair
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Signed JWT, without the bearer prefix
    pub access_token: String,
    /// `<uuid>.<hex>` plaintext, to be hashed before storage
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: chrono::Duration::seconds(access_ttl.as_secs() as i64),
        })
    }

    /// Read the secret from `JWT_SECRET_KEY`
    pub fn from_env(access_ttl: Duration) -> Result<Self, TokenError> {
        let secret = std::env::var(JWT_SECRET_ENV).map_err(|_| TokenError::MissingSecret)?;
        Self::new(&secret, access_ttl)
    }

    /// Access token plus new refresh-token material
    pub fn issue_session_tokens(&self, admin: &Admin) -> Result<SessionTokens, TokenError> {
        let (access_token, _) = self.issue_access_token(admin)?;

        Ok(SessionTokens {
            access_token,
            refresh_token: generate_refresh_token(),
        })
    }

    /// Sign a fresh access token for `admin`
    pub fn issue_access_token(&self, admin: &Admin) -> Result<(String, AdminClaims), TokenError> {
        let now = Utc::now();
        let claims = AdminClaims {
            id: admin.id,
            role: admin.role,
            first_name: admin.first_name.clone(),
            last_name: admin.last_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Signature and expiry check only
    pub fn verify_access_token(&self, token: &str) -> Result<AdminClaims, TokenError> {
        decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    pub fn sign(&self, claims: &AdminClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

/// `<random uuid>.<128 hex chars>`; the dot is never parsed back apart
fn generate_refresh_token() -> String {
    format!(
        "{}.{}",
        Uuid::new_v4(),
        platform::crypto::random_hex(REFRESH_TOKEN_RANDOM_BYTES)
    )
}

/// Strip the bearer prefix, tolerating a raw token or a URL-encoded space
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| value.strip_prefix("Bearer%20"))
        .unwrap_or(value)
}
