//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Secure random material (bytes, hex strings)
//! - Secret hashing (Argon2id) for passwords, one-time codes and opaque tokens
//! - Password policy (NIST SP 800-63B)
//! - Cookie building and extraction

pub mod cookie;
pub mod crypto;
pub mod password;
