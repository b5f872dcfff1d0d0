//! OTP Notifier Trait
//!
//! Out-of-band delivery of the login code. Implementations are in
//! `infra::mailer`.

use crate::domain::value_object::{email::Email, otp_code::OtpCode};
use crate::error::AdminResult;

#[trait_variant::make(OtpNotifier: Send)]
pub trait LocalOtpNotifier {
    /// Hand the code to the delivery channel; an error rolls back the login
    async fn send_otp(&self, email: &Email, code: &OtpCode) -> AdminResult<()>;
}

/// Notifier usable as shared HTTP state
pub trait Notifier: OtpNotifier + Clone + Send + Sync + 'static {}

impl<T> Notifier for T where T: OtpNotifier + Clone + Send + Sync + 'static {}
