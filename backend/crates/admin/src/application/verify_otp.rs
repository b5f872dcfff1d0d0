//! Verify OTP Use Case
//!
//! `OtpPending -> Verified | Expired | AttemptsExhausted`. A match consumes
//! the session and grants an access token plus a refresh token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{OtpSessionId, RefreshTokenId};
use platform::password::SecretHash;

use crate::application::config::AdminAuthConfig;
use crate::application::token::{BEARER_PREFIX, TokenService};
use crate::domain::entity::{
    admin::Admin,
    otp_session::{OtpSession, OtpSessionState},
    refresh_token::RefreshToken,
};
use crate::domain::repository::{OtpSessionRepository, SessionGrantRepository};
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::{AdminError, AdminResult};

/// Verify OTP input
pub struct VerifyOtpInput {
    pub session_id: String,
    pub otp: String,
}

/// Refresh token as shown to the client, once
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub id: RefreshTokenId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub admin: Admin,
    /// `"Bearer <jwt>"`
    pub access_token: String,
    pub refresh_token: IssuedRefreshToken,
}

/// Every way a verification can end
#[derive(Debug)]
pub enum VerifyOtpOutcome {
    Verified(Box<IssuedSession>),
    SessionNotFound,
    Expired,
    AttemptsExhausted,
    InvalidOtp { attempts_left: i32 },
}

impl VerifyOtpOutcome {
    pub fn into_result(self) -> AdminResult<IssuedSession> {
        match self {
            VerifyOtpOutcome::Verified(issued) => Ok(*issued),
            VerifyOtpOutcome::SessionNotFound => Err(AdminError::SessionNotFound),
            VerifyOtpOutcome::Expired => Err(AdminError::SessionExpired),
            VerifyOtpOutcome::AttemptsExhausted => Err(AdminError::MaxAttemptsReached),
            VerifyOtpOutcome::InvalidOtp { .. } => Err(AdminError::InvalidOtp),
        }
    }
}

/// Verify OTP use case
pub struct VerifyOtpUseCase<R>
where
    R: OtpSessionRepository + SessionGrantRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
    config: Arc<AdminAuthConfig>,
}

impl<R> VerifyOtpUseCase<R>
where
    R: OtpSessionRepository + SessionGrantRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>, config: Arc<AdminAuthConfig>) -> Self {
        Self {
            repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: VerifyOtpInput) -> AdminResult<IssuedSession> {
        self.attempt(input).await?.into_result()
    }

    /// Malformed input is an `Err(Validation)`; every state-machine branch is
    /// an `Ok` outcome.
    pub async fn attempt(&self, input: VerifyOtpInput) -> AdminResult<VerifyOtpOutcome> {
        let session_id: OtpSessionId = input
            .session_id
            .trim()
            .parse()
            .map_err(|_| AdminError::Validation("session_id must be a valid UUID".to_string()))?;
        let code = OtpCode::parse(&input.otp)?;

        let Some(session) = self.repo.find_otp_session(session_id).await? else {
            return Ok(VerifyOtpOutcome::SessionNotFound);
        };

        match session.state(Utc::now(), self.config.otp_max_attempts) {
            OtpSessionState::Live => {}
            OtpSessionState::Expired => {
                self.repo.delete_otp_session(session.id).await?;
                tracing::info!(session_id = %session.id, "OTP session expired");
                return Ok(VerifyOtpOutcome::Expired);
            }
            OtpSessionState::AttemptsExhausted => {
                self.repo.delete_otp_session(session.id).await?;
                return Ok(VerifyOtpOutcome::AttemptsExhausted);
            }
        }

        if !code.matches(&session.otp_hash) {
            return self.record_failure(&session).await;
        }

        let issued = self.grant(&session).await?;

        tracing::info!(
            admin_id = %issued.admin.id,
            refresh_token_id = %issued.refresh_token.id,
            "OTP verified, session granted"
        );

        Ok(VerifyOtpOutcome::Verified(Box::new(issued)))
    }

    async fn record_failure(&self, session: &OtpSession) -> AdminResult<VerifyOtpOutcome> {
        let max_attempts = self.config.otp_max_attempts;

        match self.repo.record_failed_attempt(session.id).await? {
            // Consumed or removed while we were hashing
            None => Ok(VerifyOtpOutcome::SessionNotFound),
            Some(attempts) if attempts >= max_attempts => {
                self.repo.delete_otp_session(session.id).await?;
                tracing::warn!(
                    session_id = %session.id,
                    admin_id = %session.admin_id,
                    attempts,
                    "OTP session closed after too many failures"
                );
                Ok(VerifyOtpOutcome::AttemptsExhausted)
            }
            Some(attempts) => Ok(VerifyOtpOutcome::InvalidOtp {
                attempts_left: max_attempts - attempts,
            }),
        }
    }

    async fn grant(&self, session: &OtpSession) -> AdminResult<IssuedSession> {
        let tokens = Arc::clone(&self.tokens);
        let refresh_ttl = self.config.refresh_token_ttl();

        self.repo
            .consume_otp_and_grant(session, self.config.max_refresh_tokens, move |admin| {
                let pair = tokens.issue_session_tokens(admin)?;
                let token_hash = SecretHash::digest(pair.refresh_token.as_bytes(), None)?;
                let record = RefreshToken::new(admin.id, token_hash, refresh_ttl);

                let issued = IssuedSession {
                    admin: admin.clone(),
                    access_token: format!("{BEARER_PREFIX}{}", pair.access_token),
                    refresh_token: IssuedRefreshToken {
                        id: record.id,
                        token: pair.refresh_token,
                        expires_at: record.expires_at,
                    },
                };

                Ok((record, issued))
            })
            .await
    }
}
