//! Email Value Object
//!
//! Validated, lower-cased admin email address. Uniqueness is enforced by
//! the `admins.email` index, so the normalized form is what gets stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, AdminResult};

/// Column width of `admins.email`
const EMAIL_MAX_LENGTH: usize = 255;
const EMAIL_MIN_LENGTH: usize = 3;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create a new email with validation
    pub fn new(email: impl Into<String>) -> AdminResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.len() < EMAIL_MIN_LENGTH || email.len() > EMAIL_MAX_LENGTH {
            return Err(AdminError::Validation(format!(
                "Email must be between {EMAIL_MIN_LENGTH} and {EMAIL_MAX_LENGTH} characters"
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AdminError::Validation("Invalid email format".to_string()));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        if !domain.contains('.')
            || domain.starts_with(['.', '-'])
            || domain.ends_with(['.', '-'])
            || domain.contains("..")
        {
            return false;
        }

        domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    }

    /// Create from database value (already normalized)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form: first character of the local part, then the domain
    pub fn masked(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().unwrap_or('*');
                format!("{first}***@{domain}")
            }
            None => "***".to_string(),
        }
    }
}

impl FromStr for Email {
    type Err = AdminError;

    fn from_str(s: &str) -> AdminResult<Self> {
        Email::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("admin@example.com").is_ok());
        assert!(Email::new("first.last@example.co.jp").is_ok());
        assert!(Email::new("ops+alerts@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "",
            "adminexample.com",
            "admin@",
            "@example.com",
            "admin@@example.com",
            "admin@example",
            "admin@.example.com",
            "admin@example..com",
        ] {
            assert!(Email::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("  Admin@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
    }

    #[test]
    fn test_email_masked() {
        let email = Email::new("admin@example.com").unwrap();
        assert_eq!(email.masked(), "a***@example.com");
    }
}
