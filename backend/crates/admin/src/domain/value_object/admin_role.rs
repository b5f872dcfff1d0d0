use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Admin role
///
/// Serialized (JSON, JWT claims, database) as `ADMIN` / `SUPER_ADMIN`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    #[default]
    #[display("ADMIN")]
    Admin,
    #[display("SUPER_ADMIN")]
    SuperAdmin,
}

impl AdminRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AdminRole::Admin => "ADMIN",
            AdminRole::SuperAdmin => "SUPER_ADMIN",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ADMIN" => Some(AdminRole::Admin),
            "SUPER_ADMIN" => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    /// Whether this role may access a route gated on `required`
    #[inline]
    pub const fn satisfies(&self, required: AdminRole) -> bool {
        match required {
            AdminRole::Admin => true,
            AdminRole::SuperAdmin => self.is_super_admin(),
        }
    }
}
