//! Manage Admins Use Case
//!
//! Provisioning, listing, profile updates and deletion. Route-level guards
//! decide who may call what; this layer only enforces data rules.

use std::sync::Arc;

use kernel::id::AdminId;
use platform::password::ClearTextPassword;
use serde::Serialize;

use crate::application::config::AdminAuthConfig;
use crate::domain::entity::admin::{Admin, AdminUpdate, NewAdmin};
use crate::domain::repository::{AdminFilter, AdminRepository};
use crate::domain::value_object::{admin_role::AdminRole, email::Email};
use crate::error::{AdminError, AdminResult};

const TEXT_MIN_LENGTH: usize = 3;
const TEXT_MAX_LENGTH: usize = 255;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Profile defaults for the seeded super admin
const SEED_FIRST_NAME: &str = "Super";
const SEED_LAST_NAME: &str = "Admin";
const SEED_COUNTRY: &str = "UAE";
const SEED_CITY: &str = "Dubai";

/// Create admin input
pub struct CreateAdminInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country: String,
    pub city: String,
    pub role: AdminRole,
}

/// Partial profile change; `role` is ignored for self-updates
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub role: Option<AdminRole>,
}

/// Listing query, before defaults are applied
#[derive(Debug, Clone, Default)]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<AdminRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Self {
            total,
            current_page: page,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminPage {
    pub admins: Vec<Admin>,
    pub pagination: Pagination,
}

/// Manage admins use case
pub struct ManageAdminsUseCase<R>
where
    R: AdminRepository,
{
    repo: Arc<R>,
    config: Arc<AdminAuthConfig>,
}

impl<R> ManageAdminsUseCase<R>
where
    R: AdminRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AdminAuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn create(&self, input: CreateAdminInput) -> AdminResult<Admin> {
        let email = Email::new(input.email)?;
        let first_name = required_text("first_name", input.first_name)?;
        let last_name = required_text("last_name", input.last_name)?;
        let phone = optional_text("phone", input.phone)?;
        let country = required_text("country", input.country)?;
        let city = required_text("city", input.city)?;

        if self
            .repo
            .admin_exists(Some(&email), phone.as_deref(), None)
            .await?
        {
            return Err(AdminError::AdminAlreadyExists);
        }

        if input.password != input.confirm_password {
            return Err(AdminError::Validation(
                "Password and confirm password do not match".to_string(),
            ));
        }

        let password = ClearTextPassword::new(input.password)?;
        let password_hash = password.hash(self.config.pepper())?;

        let admin = Admin::new(NewAdmin {
            email,
            first_name,
            last_name,
            phone,
            country,
            city,
            role: input.role,
        });

        self.repo.create_admin(&admin, &password_hash).await?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin created");

        Ok(admin)
    }

    pub async fn list(&self, query: AdminListQuery) -> AdminResult<AdminPage> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(AdminError::Validation("page must be at least 1".to_string()));
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AdminError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AdminError::Validation("page is out of range".to_string()))?;

        let filter = AdminFilter {
            offset,
            limit,
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            role: query.role,
        };

        let (admins, total) = self.repo.list_admins(&filter).await?;

        Ok(AdminPage {
            admins,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn get(&self, id: AdminId) -> AdminResult<Admin> {
        self.repo
            .find_admin(id)
            .await?
            .ok_or(AdminError::AdminNotFound)
    }

    /// Self-service update; the role cannot be changed this way
    pub async fn update_me(&self, id: AdminId, changes: ProfileChanges) -> AdminResult<Admin> {
        self.update(id, ProfileChanges { role: None, ..changes })
            .await
    }

    pub async fn update(&self, id: AdminId, changes: ProfileChanges) -> AdminResult<Admin> {
        let update = AdminUpdate {
            email: changes.email.map(Email::new).transpose()?,
            first_name: changes
                .first_name
                .map(|v| required_text("first_name", v))
                .transpose()?,
            last_name: changes
                .last_name
                .map(|v| required_text("last_name", v))
                .transpose()?,
            phone: optional_text("phone", changes.phone)?,
            country: changes
                .country
                .map(|v| required_text("country", v))
                .transpose()?,
            city: changes.city.map(|v| required_text("city", v)).transpose()?,
            role: changes.role,
        };

        let mut admin = self.get(id).await?;

        if (update.email.is_some() || update.phone.is_some())
            && self
                .repo
                .admin_exists(update.email.as_ref(), update.phone.as_deref(), Some(id))
                .await?
        {
            return Err(AdminError::AdminAlreadyExists);
        }

        if update.is_empty() {
            return Ok(admin);
        }

        admin.apply(update);

        if !self.repo.update_admin(&admin).await? {
            return Err(AdminError::AdminNotFound);
        }

        tracing::info!(admin_id = %admin.id, "Admin updated");

        Ok(admin)
    }

    pub async fn delete(&self, actor: AdminId, target: AdminId) -> AdminResult<()> {
        if actor == target {
            return Err(AdminError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.repo.delete_admin(target).await? {
            return Err(AdminError::AdminNotFound);
        }

        tracing::info!(admin_id = %target, deleted_by = %actor, "Admin deleted");

        Ok(())
    }

    /// Create the initial super admin unless the email is taken
    ///
    /// Returns whether a row was inserted.
    pub async fn seed_super_admin(&self, email: &str, password: &str) -> AdminResult<bool> {
        let email = Email::new(email)?;

        if self.repo.admin_exists(Some(&email), None, None).await? {
            tracing::debug!(email = %email.masked(), "Super admin already present");
            return Ok(false);
        }

        let password_hash = ClearTextPassword::new(password.to_string())?.hash(self.config.pepper())?;

        let admin = Admin::new(NewAdmin {
            email,
            first_name: SEED_FIRST_NAME.to_string(),
            last_name: SEED_LAST_NAME.to_string(),
            phone: None,
            country: SEED_COUNTRY.to_string(),
            city: SEED_CITY.to_string(),
            role: AdminRole::SuperAdmin,
        });

        self.repo.create_admin(&admin, &password_hash).await?;

        tracing::info!(admin_id = %admin.id, email = %admin.email.masked(), "Super admin seeded");

        Ok(true)
    }
}

fn required_text(field: &str, value: String) -> AdminResult<String> {
    let value = value.trim().to_string();
    let len = value.chars().count();

    if !(TEXT_MIN_LENGTH..=TEXT_MAX_LENGTH).contains(&len) {
        return Err(AdminError::Validation(format!(
            "{field} must be between {TEXT_MIN_LENGTH} and {TEXT_MAX_LENGTH} characters"
        )));
    }

    Ok(value)
}

/// Blank means absent
fn optional_text(field: &str, value: Option<String>) -> AdminResult<Option<String>> {
    match value {
        Some(v) if !v.trim().is_empty() => required_text(field, v).map(Some),
        _ => Ok(None),
    }
}
