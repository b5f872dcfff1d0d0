//! Application Layer
//!
//! Use cases orchestrating domain logic, plus the token service and
//! configuration they share.

pub mod authorize;
pub mod config;
pub mod manage_admins;
pub mod sign_in;
pub mod sign_out;
pub mod token;
pub mod verify_otp;

pub use authorize::{AccessCredentials, AuthorizeUseCase, Authorized, require_role};
pub use config::AdminAuthConfig;
pub use manage_admins::{
    AdminListQuery, AdminPage, CreateAdminInput, ManageAdminsUseCase, Pagination, ProfileChanges,
};
pub use sign_in::{LoginOutcome, OtpChallenge, SignInInput, SignInUseCase};
pub use sign_out::{SignOutOutcome, SignOutUseCase};
pub use token::{AdminClaims, SessionTokens, TokenError, TokenService};
pub use verify_otp::{IssuedSession, VerifyOtpInput, VerifyOtpOutcome, VerifyOtpUseCase};
