//! Sign Out Use Case
//!
//! Revokes the refresh token named by the cookies. Unknown or mismatched
//! tokens are treated as already signed out.

use std::sync::Arc;

use kernel::id::RefreshTokenId;

use crate::domain::repository::RefreshTokenRepository;
use crate::error::AdminResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutOutcome {
    Revoked,
    AlreadySignedOut,
}

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: RefreshTokenRepository,
{
    repo: Arc<R>,
}

impl<R> SignOutUseCase<R>
where
    R: RefreshTokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        refresh_token_id: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AdminResult<SignOutOutcome> {
        let (Some(id), Some(token)) = (refresh_token_id, refresh_token) else {
            return Ok(SignOutOutcome::AlreadySignedOut);
        };

        let Ok(id) = id.trim().parse::<RefreshTokenId>() else {
            return Ok(SignOutOutcome::AlreadySignedOut);
        };

        let Some(record) = self.repo.find_refresh_token(id).await? else {
            return Ok(SignOutOutcome::AlreadySignedOut);
        };

        if !record.matches(token) {
            tracing::warn!(refresh_token_id = %id, "Logout with mismatched refresh token");
            return Ok(SignOutOutcome::AlreadySignedOut);
        }

        self.repo.delete_refresh_token(id).await?;

        tracing::info!(
            admin_id = %record.admin_id,
            refresh_token_id = %id,
            "Admin signed out"
        );

        Ok(SignOutOutcome::Revoked)
    }
}
