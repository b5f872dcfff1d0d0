//! Admin Entity
//!
//! Admin principal profile. The password hash lives in [`AdminCredentials`]
//! and is only loaded by the login path.

use chrono::{DateTime, Utc};
use kernel::id::AdminId;
use platform::password::SecretHash;

use crate::domain::value_object::{admin_role::AdminRole, email::Email};

/// Admin entity
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: AdminId,
    /// Unique, lower-cased
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Unique when present
    pub phone: Option<String>,
    pub country: String,
    pub city: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields of a new admin
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country: String,
    pub city: String,
    pub role: AdminRole,
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct AdminUpdate {
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub role: Option<AdminRole>,
}

/// Projection used by login: id, email and password hash only
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub id: AdminId,
    pub email: Email,
    pub password_hash: SecretHash,
}

impl Admin {
    pub fn new(profile: NewAdmin) -> Self {
        let now = Utc::now();

        Self {
            id: AdminId::new(),
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            country: profile.country,
            city: profile.city,
            role: profile.role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`
    pub fn apply(&mut self, update: AdminUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(country) = update.country {
            self.country = country;
        }
        if let Some(city) = update.city {
            self.city = city;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        self.updated_at = Utc::now();
    }
}

impl AdminUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.country.is_none()
            && self.city.is_none()
            && self.role.is_none()
    }
}
