//! Value Object Module

pub mod admin_role;
pub mod email;
pub mod otp_code;
