//! Response Envelope
//!
//! Every endpoint answers with `{success, message, data?, errors?, timestamp}`.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Uniform response envelope
///
/// ## Examples
/// ```rust
/// use kernel::response::ApiResponse;
///
/// let ok = ApiResponse::success("OTP sent to email", 42);
/// assert!(ok.is_success());
///
/// let bare = ApiResponse::message("Logout successful");
/// assert!(bare.data().is_none());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    message: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<serde_json::Value>,
    timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Success with a payload
    pub fn success(message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl ApiResponse<()> {
    /// Success without `data`
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        message: impl Into<Cow<'static, str>>,
        errors: Option<serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(feature = "axum")]
impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}
