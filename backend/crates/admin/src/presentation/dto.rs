//! API DTOs (Data Transfer Objects)
//!
//! Field names are snake_case on the wire.

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, OtpSessionId, RefreshTokenId};
use serde::{Deserialize, Serialize};

use crate::application::manage_admins::{AdminPage, Pagination};
use crate::application::verify_otp::IssuedSession;
use crate::domain::entity::admin::Admin;
use crate::domain::value_object::admin_role::AdminRole;

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: OtpSessionId,
    pub email: String,
}

// ============================================================================
// Verify OTP
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub session_id: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub id: RefreshTokenId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Admin profile plus both tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(flatten)]
    pub admin: AdminResponse,
    /// `"Bearer <jwt>"`
    pub access_token: String,
    pub refresh_token: RefreshTokenResponse,
}

impl From<IssuedSession> for VerifyOtpResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            admin: issued.admin.into(),
            access_token: issued.access_token,
            refresh_token: RefreshTokenResponse {
                id: issued.refresh_token.id,
                token: issued.refresh_token.token,
                expires_at: issued.refresh_token.expires_at,
            },
        }
    }
}

// ============================================================================
// Admin Profile
// ============================================================================

/// Public admin profile; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponse {
    pub id: AdminId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country: String,
    pub city: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.as_str().to_string(),
            first_name: admin.first_name,
            last_name: admin.last_name,
            phone: admin.phone,
            country: admin.country,
            city: admin.city,
            role: admin.role,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub country: String,
    pub city: String,
    #[serde(default)]
    pub role: AdminRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAdminRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub role: Option<AdminRole>,
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAdminsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<AdminRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminListResponse {
    pub admins: Vec<AdminResponse>,
    pub pagination: Pagination,
}

impl From<AdminPage> for AdminListResponse {
    fn from(page: AdminPage) -> Self {
        Self {
            admins: page.admins.into_iter().map(AdminResponse::from).collect(),
            pagination: page.pagination,
        }
    }
}
