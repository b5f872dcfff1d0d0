//! Entity Module

pub mod admin;
pub mod otp_session;
pub mod refresh_token;
