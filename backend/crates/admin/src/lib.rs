//! Admin Authentication Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and notifier traits
//! - `application/` - Use cases, token service and configuration
//! - `infra/` - PostgreSQL repository and OTP mail delivery
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Flow
//! 1. `POST /login` checks email + password and mails a 6-digit OTP
//! 2. `POST /verify-otp` exchanges the OTP for a JWT access token and an
//!    opaque refresh token (both delivered as cookies)
//! 3. Protected routes validate the access token and silently mint a new
//!    one from the refresh token when it has expired
//! 4. `GET /logout` revokes the refresh token and clears the cookies
//!
//! ## Security Model
//! - Passwords, OTP codes and refresh tokens are stored as Argon2id hashes
//! - At most one pending OTP session per admin, five attempts per session
//! - At most five refresh tokens per admin; the sixth grant resets the set

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AdminAuthConfig;
pub use application::token::{AdminClaims, TokenError, TokenService};
pub use error::{AdminError, AdminResult};
pub use infra::mailer::Mailer;
pub use infra::postgres::PgAdminRepository;
pub use presentation::handlers::AdminAppState;
pub use presentation::router::admin_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
