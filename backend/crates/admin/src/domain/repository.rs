//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! Method names carry their table so one store can implement every trait
//! without ambiguous calls.

use std::future::Future;

use kernel::id::{AdminId, OtpSessionId, RefreshTokenId};
use platform::password::SecretHash;

use crate::domain::entity::{
    admin::{Admin, AdminCredentials},
    otp_session::OtpSession,
    refresh_token::RefreshToken,
};
use crate::domain::value_object::{admin_role::AdminRole, email::Email};
use crate::error::AdminResult;

/// Admin listing filter
#[derive(Debug, Clone, Default)]
pub struct AdminFilter {
    pub offset: i64,
    pub limit: i64,
    /// Case-insensitive substring of `first_name`
    pub search: Option<String>,
    pub role: Option<AdminRole>,
}

/// Admin repository trait
#[trait_variant::make(AdminRepository: Send)]
pub trait LocalAdminRepository {
    /// Login projection by email
    async fn find_credentials_by_email(&self, email: &Email)
    -> AdminResult<Option<AdminCredentials>>;

    async fn find_admin(&self, id: AdminId) -> AdminResult<Option<Admin>>;

    /// Whether another admin already uses this email or phone
    async fn admin_exists(
        &self,
        email: Option<&Email>,
        phone: Option<&str>,
        exclude: Option<AdminId>,
    ) -> AdminResult<bool>;

    /// Fails with `AdminAlreadyExists` on a uniqueness race
    async fn create_admin(&self, admin: &Admin, password_hash: &SecretHash) -> AdminResult<()>;

    /// Returns false when the admin does not exist
    async fn update_admin(&self, admin: &Admin) -> AdminResult<bool>;

    /// Returns false when the admin does not exist
    async fn delete_admin(&self, id: AdminId) -> AdminResult<bool>;

    /// Newest first, with the total count matching the filter
    async fn list_admins(&self, filter: &AdminFilter) -> AdminResult<(Vec<Admin>, i64)>;
}

/// OTP session repository trait
#[trait_variant::make(OtpSessionRepository: Send)]
pub trait LocalOtpSessionRepository {
    async fn find_otp_session_by_admin(&self, admin_id: AdminId)
    -> AdminResult<Option<OtpSession>>;

    async fn find_otp_session(&self, id: OtpSessionId) -> AdminResult<Option<OtpSession>>;

    /// Store a new session and run `delivery` in the same transaction
    ///
    /// Expired sessions of the same admin are removed first. A live one makes
    /// this fail with `SessionAlreadyPending`. If `delivery` fails nothing is
    /// persisted.
    async fn create_otp_session<D>(&self, session: &OtpSession, delivery: D) -> AdminResult<()>
    where
        D: Future<Output = AdminResult<()>> + Send;

    /// Atomically bump the attempt counter; `None` if the row is gone
    async fn record_failed_attempt(&self, id: OtpSessionId) -> AdminResult<Option<i32>>;

    async fn delete_otp_session(&self, id: OtpSessionId) -> AdminResult<()>;

    async fn cleanup_expired_sessions(&self) -> AdminResult<u64>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn find_refresh_token(&self, id: RefreshTokenId) -> AdminResult<Option<RefreshToken>>;

    /// Returns false when nothing was deleted
    async fn delete_refresh_token(&self, id: RefreshTokenId) -> AdminResult<bool>;

    async fn cleanup_expired_refresh_tokens(&self) -> AdminResult<u64>;
}

/// Successful OTP verification as one unit of work
#[trait_variant::make(SessionGrantRepository: Send)]
pub trait LocalSessionGrantRepository {
    /// In one transaction:
    /// 1. delete the OTP session (`SessionNotFound` if already consumed)
    /// 2. load its admin (`AdminNotFound` if gone)
    /// 3. drop every refresh token of the admin when `max_refresh_tokens` is reached
    /// 4. call `grant` and insert the refresh token it returns
    async fn consume_otp_and_grant<F, T>(
        &self,
        session: &OtpSession,
        max_refresh_tokens: i64,
        grant: F,
    ) -> AdminResult<T>
    where
        F: FnOnce(&Admin) -> AdminResult<(RefreshToken, T)> + Send,
        T: Send;
}

/// Everything the HTTP layer needs from a store
pub trait AdminStore:
    AdminRepository
    + OtpSessionRepository
    + RefreshTokenRepository
    + SessionGrantRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AdminStore for T where
    T: AdminRepository
        + OtpSessionRepository
        + RefreshTokenRepository
        + SessionGrantRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
