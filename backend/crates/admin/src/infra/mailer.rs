//! OTP Mail Delivery
//!
//! `LogNotifier` for local development, `WebhookNotifier` for a JSON mail
//! relay. `Mailer` picks one from the environment so HTTP state stays
//! concrete.

use std::time::Duration;

use serde::Serialize;

use crate::domain::notifier::OtpNotifier;
use crate::domain::value_object::{email::Email, otp_code::OtpCode};
use crate::error::{AdminError, AdminResult};

const WEBHOOK_URL_ENV: &str = "MAIL_WEBHOOK_URL";
const MAIL_FROM_ENV: &str = "MAIL_FROM";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const OTP_SUBJECT: &str = "Your OTP Code";

fn otp_body(code: &OtpCode) -> String {
    format!(
        "<p>Your one-time login code is <strong>{}</strong>.</p>\
         <p>It expires in 5 minutes. If you did not try to sign in, ignore this email.</p>",
        code.as_str()
    )
}

/// Writes the dispatch to the log instead of sending mail
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, email: &Email, code: &OtpCode) -> AdminResult<()> {
        tracing::info!(email = %email.masked(), "OTP dispatched to log notifier");
        tracing::debug!(email = %email, otp = code.as_str(), "Development OTP");
        Ok(())
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Posts the OTP mail to an HTTP relay
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> AdminResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdminError::Internal(format!("Failed to build mail client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            from: from.into(),
        })
    }
}

impl OtpNotifier for WebhookNotifier {
    async fn send_otp(&self, email: &Email, code: &OtpCode) -> AdminResult<()> {
        let payload = MailPayload {
            from: &self.from,
            to: email.as_str(),
            subject: OTP_SUBJECT,
            html: otp_body(code),
        };

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AdminError::Delivery(e.to_string()))?;

        tracing::info!(email = %email.masked(), "OTP mail sent");

        Ok(())
    }
}

/// Notifier selected at startup
#[derive(Debug, Clone)]
pub enum Mailer {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl Mailer {
    /// Webhook when `MAIL_WEBHOOK_URL` and `MAIL_FROM` are set, log otherwise
    pub fn from_env() -> AdminResult<Self> {
        match (
            std::env::var(WEBHOOK_URL_ENV).ok().filter(|v| !v.trim().is_empty()),
            std::env::var(MAIL_FROM_ENV).ok().filter(|v| !v.trim().is_empty()),
        ) {
            (Some(url), Some(from)) => Ok(Mailer::Webhook(WebhookNotifier::new(url, from)?)),
            _ => {
                tracing::warn!("Mail relay not configured, OTP codes go to the log");
                Ok(Mailer::Log(LogNotifier))
            }
        }
    }
}

impl OtpNotifier for Mailer {
    async fn send_otp(&self, email: &Email, code: &OtpCode) -> AdminResult<()> {
        match self {
            Mailer::Log(n) => n.send_otp(email, code).await,
            Mailer::Webhook(n) => n.send_otp(email, code).await,
        }
    }
}
