//! Authorize Use Case
//!
//! Access guard for protected routes. A valid access token passes as is; an
//! invalid or expired one is replaced from the refresh-token cookies when
//! those still check out.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::RefreshTokenId;

use crate::application::token::{AdminClaims, BEARER_PREFIX, TokenService, strip_bearer};
use crate::domain::repository::{AdminRepository, RefreshTokenRepository};
use crate::domain::value_object::admin_role::AdminRole;
use crate::error::{AdminError, AdminResult};

/// Cookie values presented by the client
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessCredentials<'a> {
    pub access_token: Option<&'a str>,
    pub refresh_token: Option<&'a str>,
    pub refresh_token_id: Option<&'a str>,
}

/// Request principal, plus the replacement access token if one was minted
#[derive(Debug, Clone)]
pub struct Authorized {
    pub principal: AdminClaims,
    /// `"Bearer <jwt>"`, to be written back as the access cookie
    pub refreshed_access_token: Option<String>,
}

/// Authorize use case
pub struct AuthorizeUseCase<R>
where
    R: AdminRepository + RefreshTokenRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> AuthorizeUseCase<R>
where
    R: AdminRepository + RefreshTokenRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Every failure, including store errors, surfaces as `AccessDenied`
    pub async fn execute(&self, credentials: AccessCredentials<'_>) -> AdminResult<Authorized> {
        let Some(access_token) = credentials.access_token else {
            return Err(AdminError::AccessDenied);
        };

        if let Ok(principal) = self.tokens.verify_access_token(strip_bearer(access_token)) {
            return Ok(Authorized {
                principal,
                refreshed_access_token: None,
            });
        }

        match self.refresh(credentials).await {
            Ok(authorized) => Ok(authorized),
            Err(AdminError::AccessDenied) => Err(AdminError::AccessDenied),
            Err(e) => {
                tracing::error!(error = %e, "Access token refresh failed");
                Err(AdminError::AccessDenied)
            }
        }
    }

    async fn refresh(&self, credentials: AccessCredentials<'_>) -> AdminResult<Authorized> {
        let (Some(token), Some(id)) = (credentials.refresh_token, credentials.refresh_token_id)
        else {
            return Err(AdminError::AccessDenied);
        };

        let id: RefreshTokenId = id.trim().parse().map_err(|_| AdminError::AccessDenied)?;

        let record = self
            .repo
            .find_refresh_token(id)
            .await?
            .ok_or(AdminError::AccessDenied)?;

        if record.is_expired_at(Utc::now()) {
            self.repo.delete_refresh_token(id).await?;
            tracing::info!(refresh_token_id = %id, "Expired refresh token removed");
            return Err(AdminError::AccessDenied);
        }

        if !record.matches(token) {
            tracing::warn!(refresh_token_id = %id, "Refresh token mismatch");
            return Err(AdminError::AccessDenied);
        }

        let admin = self
            .repo
            .find_admin(record.admin_id)
            .await?
            .ok_or(AdminError::AccessDenied)?;

        let (access_token, principal) = self.tokens.issue_access_token(&admin)?;

        tracing::debug!(admin_id = %admin.id, "Access token refreshed");

        Ok(Authorized {
            principal,
            refreshed_access_token: Some(format!("{BEARER_PREFIX}{access_token}")),
        })
    }
}

/// Role gate; `None` means the access guard did not run
pub fn require_role(
    principal: Option<&AdminClaims>,
    required: AdminRole,
) -> AdminResult<&AdminClaims> {
    let principal = principal.ok_or(AdminError::AccessDenied)?;

    if !principal.role.satisfies(required) {
        tracing::warn!(
            admin_id = %principal.id,
            role = %principal.role,
            required = %required,
            "Role not allowed"
        );
        return Err(AdminError::InsufficientRole);
    }

    Ok(principal)
}
