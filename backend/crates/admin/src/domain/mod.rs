//! Domain Layer
//!
//! Contains entities, value objects, repository and notifier traits.

pub mod entity;
pub mod notifier;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    admin::{Admin, AdminCredentials},
    otp_session::{OtpSession, OtpSessionState},
    refresh_token::RefreshToken,
};
pub use notifier::{Notifier, OtpNotifier};
pub use repository::{
    AdminRepository, AdminStore, OtpSessionRepository, RefreshTokenRepository,
    SessionGrantRepository,
};
