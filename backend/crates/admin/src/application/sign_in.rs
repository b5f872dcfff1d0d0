//! Sign In Use Case
//!
//! Password check followed by OTP issuance (`NoSession -> OtpPending`).

use std::sync::Arc;

use chrono::Utc;
use kernel::id::OtpSessionId;
use platform::password::ClearTextPassword;

use crate::application::config::AdminAuthConfig;
use crate::domain::entity::otp_session::OtpSession;
use crate::domain::notifier::OtpNotifier;
use crate::domain::repository::{AdminRepository, OtpSessionRepository};
use crate::domain::value_object::{email::Email, otp_code::OtpCode};
use crate::error::{AdminError, AdminResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Challenge handed back to the client
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub session_id: OtpSessionId,
    pub email: Email,
}

/// Every way a login attempt can end
#[derive(Debug)]
pub enum LoginOutcome {
    Issued(OtpChallenge),
    InvalidCredentials,
    SessionAlreadyPending,
}

impl LoginOutcome {
    pub fn into_result(self) -> AdminResult<OtpChallenge> {
        match self {
            LoginOutcome::Issued(challenge) => Ok(challenge),
            LoginOutcome::InvalidCredentials => Err(AdminError::InvalidCredentials),
            LoginOutcome::SessionAlreadyPending => Err(AdminError::SessionAlreadyPending),
        }
    }
}

/// Sign in use case
pub struct SignInUseCase<R, N>
where
    R: AdminRepository + OtpSessionRepository,
    N: OtpNotifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    config: Arc<AdminAuthConfig>,
}

impl<R, N> SignInUseCase<R, N>
where
    R: AdminRepository + OtpSessionRepository,
    N: OtpNotifier + Sync,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, config: Arc<AdminAuthConfig>) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AdminResult<OtpChallenge> {
        self.attempt(input).await?.into_result()
    }

    /// Run the login and report the branch taken
    ///
    /// `Err` is reserved for infrastructure failures (database, mail relay).
    pub async fn attempt(&self, input: SignInInput) -> AdminResult<LoginOutcome> {
        // A malformed email is indistinguishable from an unknown one
        let Ok(email) = Email::new(input.email) else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let Some(credentials) = self.repo.find_credentials_by_email(&email).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let password = ClearTextPassword::for_verification(input.password);
        if !credentials
            .password_hash
            .verify(&password, self.config.pepper())
        {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        // Expired leftovers are swept inside create_otp_session
        if let Some(existing) = self
            .repo
            .find_otp_session_by_admin(credentials.id)
            .await?
            && !existing.is_expired_at(Utc::now())
        {
            tracing::info!(
                admin_id = %credentials.id,
                "Login rejected, OTP session still pending"
            );
            return Ok(LoginOutcome::SessionAlreadyPending);
        }

        let code = OtpCode::generate();
        let session = OtpSession::new(credentials.id, code.hash()?, self.config.otp_ttl());

        let delivery = self.notifier.send_otp(&credentials.email, &code);
        match self.repo.create_otp_session(&session, delivery).await {
            Ok(()) => {}
            // Lost the race against a concurrent login
            Err(AdminError::SessionAlreadyPending) => {
                return Ok(LoginOutcome::SessionAlreadyPending);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            admin_id = %credentials.id,
            session_id = %session.id,
            email = %credentials.email.masked(),
            "OTP issued"
        );

        Ok(LoginOutcome::Issued(OtpChallenge {
            session_id: session.id,
            email: credentials.email,
        }))
    }
}
