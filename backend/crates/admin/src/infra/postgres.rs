//! PostgreSQL Repository Implementations

use std::future::Future;

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, OtpSessionId, RefreshTokenId};
use platform::password::SecretHash;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    admin::{Admin, AdminCredentials},
    otp_session::OtpSession,
    refresh_token::RefreshToken,
};
use crate::domain::repository::{
    AdminFilter, AdminRepository, OtpSessionRepository, RefreshTokenRepository,
    SessionGrantRepository,
};
use crate::domain::value_object::{admin_role::AdminRole, email::Email};
use crate::error::{AdminError, AdminResult};

/// PostgreSQL-backed admin repository
#[derive(Clone)]
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Escape `LIKE` wildcards in user input
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ============================================================================
// Admin Repository Implementation
// ============================================================================

impl AdminRepository for PgAdminRepository {
    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> AdminResult<Option<AdminCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, email, password_hash FROM admins WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credentials()).transpose()
    }

    async fn find_admin(&self, id: AdminId) -> AdminResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT
                id,
                email,
                first_name,
                last_name,
                phone,
                country,
                city,
                role,
                created_at,
                updated_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_admin()).transpose()
    }

    async fn admin_exists(
        &self,
        email: Option<&Email>,
        phone: Option<&str>,
        exclude: Option<AdminId>,
    ) -> AdminResult<bool> {
        if email.is_none() && phone.is_none() {
            return Ok(false);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM admins
                WHERE (email = $1 OR phone = $2)
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(email.map(Email::as_str))
        .bind(phone)
        .bind(exclude.map(AdminId::into_uuid))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_admin(&self, admin: &Admin, password_hash: &SecretHash) -> AdminResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (
                id,
                email,
                password_hash,
                first_name,
                last_name,
                phone,
                country,
                city,
                role,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(admin.id.as_uuid())
        .bind(admin.email.as_str())
        .bind(password_hash.as_phc_string())
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(admin.phone.as_deref())
        .bind(&admin.country)
        .bind(&admin.city)
        .bind(admin.role.code())
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AdminError::AdminAlreadyExists
            } else {
                AdminError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn update_admin(&self, admin: &Admin) -> AdminResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE admins SET
                email = $2,
                first_name = $3,
                last_name = $4,
                phone = $5,
                country = $6,
                city = $7,
                role = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(admin.id.as_uuid())
        .bind(admin.email.as_str())
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(admin.phone.as_deref())
        .bind(&admin.country)
        .bind(&admin.city)
        .bind(admin.role.code())
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AdminError::AdminAlreadyExists
            } else {
                AdminError::Database(e)
            }
        })?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn delete_admin(&self, id: AdminId) -> AdminResult<bool> {
        let deleted = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list_admins(&self, filter: &AdminFilter) -> AdminResult<(Vec<Admin>, i64)> {
        let search = filter.search.as_deref().map(escape_like);
        let role = filter.role.map(|r| r.code());

        let rows = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT
                id,
                email,
                first_name,
                last_name,
                phone,
                country,
                city,
                role,
                created_at,
                updated_at
            FROM admins
            WHERE ($1::text IS NULL OR first_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR role = $2)
            ORDER BY created_at DESC
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(search.as_deref())
        .bind(role)
        .bind(filter.offset)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM admins
            WHERE ($1::text IS NULL OR first_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR role = $2)
            "#,
        )
        .bind(search.as_deref())
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        let admins = rows
            .into_iter()
            .map(AdminRow::into_admin)
            .collect::<AdminResult<Vec<_>>>()?;

        Ok((admins, total))
    }
}

// ============================================================================
// OTP Session Repository Implementation
// ============================================================================

impl OtpSessionRepository for PgAdminRepository {
    async fn find_otp_session_by_admin(
        &self,
        admin_id: AdminId,
    ) -> AdminResult<Option<OtpSession>> {
        let row = sqlx::query_as::<_, OtpSessionRow>(
            r#"
            SELECT id, admin_id, otp_hash, expires_at, attempts, created_at, updated_at
            FROM admin_sessions
            WHERE admin_id = $1
            "#,
        )
        .bind(admin_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn find_otp_session(&self, id: OtpSessionId) -> AdminResult<Option<OtpSession>> {
        let row = sqlx::query_as::<_, OtpSessionRow>(
            r#"
            SELECT id, admin_id, otp_hash, expires_at, attempts, created_at, updated_at
            FROM admin_sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn create_otp_session<D>(&self, session: &OtpSession, delivery: D) -> AdminResult<()>
    where
        D: Future<Output = AdminResult<()>> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let stale = sqlx::query("DELETE FROM admin_sessions WHERE admin_id = $1 AND expires_at < $2")
            .bind(session.admin_id.as_uuid())
            .bind(session.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if stale > 0 {
            tracing::debug!(admin_id = %session.admin_id, "Removed expired OTP session");
        }

        sqlx::query(
            r#"
            INSERT INTO admin_sessions (
                id,
                admin_id,
                otp_hash,
                expires_at,
                attempts,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.admin_id.as_uuid())
        .bind(session.otp_hash.as_phc_string())
        .bind(session.expires_at)
        .bind(session.attempts)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AdminError::SessionAlreadyPending
            } else {
                AdminError::Database(e)
            }
        })?;

        // Dropping the transaction on error rolls the insert back
        delivery.await?;

        tx.commit().await?;

        Ok(())
    }

    async fn record_failed_attempt(&self, id: OtpSessionId) -> AdminResult<Option<i32>> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE admin_sessions
            SET attempts = attempts + 1, updated_at = now()
            WHERE id = $1
            RETURNING attempts
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn delete_otp_session(&self, id: OtpSessionId) -> AdminResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AdminResult<u64> {
        let deleted = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired OTP sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAdminRepository {
    async fn find_refresh_token(&self, id: RefreshTokenId) -> AdminResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, admin_id, refresh_token_hash, expires_at, created_at, updated_at
            FROM admin_refresh_tokens
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_refresh_token()).transpose()
    }

    async fn delete_refresh_token(&self, id: RefreshTokenId) -> AdminResult<bool> {
        let deleted = sqlx::query("DELETE FROM admin_refresh_tokens WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn cleanup_expired_refresh_tokens(&self) -> AdminResult<u64> {
        let deleted = sqlx::query("DELETE FROM admin_refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

// ============================================================================
// Session Grant Implementation
// ============================================================================

impl SessionGrantRepository for PgAdminRepository {
    async fn consume_otp_and_grant<F, T>(
        &self,
        session: &OtpSession,
        max_refresh_tokens: i64,
        grant: F,
    ) -> AdminResult<T>
    where
        F: FnOnce(&Admin) -> AdminResult<(RefreshToken, T)> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(session.id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if consumed == 0 {
            return Err(AdminError::SessionNotFound);
        }

        // Row lock serializes concurrent grants for the same admin
        let admin = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT
                id,
                email,
                first_name,
                last_name,
                phone,
                country,
                city,
                role,
                created_at,
                updated_at
            FROM admins
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(session.admin_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AdminError::AdminNotFound)?
        .into_admin()?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admin_refresh_tokens WHERE admin_id = $1",
        )
        .bind(admin.id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if existing >= max_refresh_tokens {
            sqlx::query("DELETE FROM admin_refresh_tokens WHERE admin_id = $1")
                .bind(admin.id.as_uuid())
                .execute(&mut *tx)
                .await?;

            tracing::info!(
                admin_id = %admin.id,
                revoked = existing,
                "Refresh token cap reached, previous tokens revoked"
            );
        }

        let (token, output) = grant(&admin)?;

        sqlx::query(
            r#"
            INSERT INTO admin_refresh_tokens (
                id,
                admin_id,
                refresh_token_hash,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.admin_id.as_uuid())
        .bind(token.token_hash.as_phc_string())
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(output)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    country: String,
    city: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AdminRow {
    fn into_admin(self) -> AdminResult<Admin> {
        let role = AdminRole::from_code(&self.role)
            .ok_or_else(|| AdminError::Internal(format!("Invalid admin role: {}", self.role)))?;

        Ok(Admin {
            id: AdminId::from_uuid(self.id),
            email: Email::from_db(self.email),
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            country: self.country,
            city: self.city,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

impl CredentialsRow {
    fn into_credentials(self) -> AdminResult<AdminCredentials> {
        Ok(AdminCredentials {
            id: AdminId::from_uuid(self.id),
            email: Email::from_db(self.email),
            password_hash: SecretHash::from_phc_string(self.password_hash)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OtpSessionRow {
    id: Uuid,
    admin_id: Uuid,
    otp_hash: String,
    expires_at: DateTime<Utc>,
    attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OtpSessionRow {
    fn into_session(self) -> AdminResult<OtpSession> {
        Ok(OtpSession {
            id: OtpSessionId::from_uuid(self.id),
            admin_id: AdminId::from_uuid(self.admin_id),
            otp_hash: SecretHash::from_phc_string(self.otp_hash)?,
            expires_at: self.expires_at,
            attempts: self.attempts,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    admin_id: Uuid,
    refresh_token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_refresh_token(self) -> AdminResult<RefreshToken> {
        Ok(RefreshToken {
            id: RefreshTokenId::from_uuid(self.id),
            admin_id: AdminId::from_uuid(self.admin_id),
            token_hash: SecretHash::from_phc_string(self.refresh_token_hash)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
