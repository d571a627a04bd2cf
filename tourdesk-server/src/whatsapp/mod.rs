//! WhatsApp Cloud API integration
//!
//! - `client`: outbound text/template messages and read receipts
//! - `phone`: E.164 normalization
//! - `webhook`: signature check and payload parsing
//! - `campaign`: paced template broadcast

pub mod campaign;
pub mod client;
pub mod phone;
pub mod webhook;

pub use campaign::{CampaignRunner, CampaignStore, CampaignTally, TemplateSender};
pub use client::WhatsAppClient;
pub use phone::normalize_phone;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Hours after the last inbound message during which free-form text is allowed
pub const SESSION_WINDOW_HOURS: i64 = 24;

/// Graph API error code for a free-form message outside the session window
const REENGAGEMENT_REQUIRED: i64 = 131047;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with an error object
    #[error("WhatsApp API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl WhatsAppError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, WhatsAppError::Api { code: Some(REENGAGEMENT_REQUIRED), .. })
    }
}

impl From<WhatsAppError> for AppError {
    fn from(e: WhatsAppError) -> Self {
        match e {
            WhatsAppError::InvalidPhone(ref phone) => {
                AppError::with_message(ErrorCode::InvalidPhoneNumber, e.to_string())
                    .with_detail("phone", phone.clone())
            }
            ref api if api.is_session_expired() => AppError::new(ErrorCode::WhatsAppSessionExpired),
            WhatsAppError::Api { status, code, ref message } => {
                tracing::warn!(status, ?code, message = %message, "WhatsApp API rejected request");
                let err = AppError::with_message(ErrorCode::WhatsAppSendFailed, message.clone())
                    .with_detail("provider_status", status);
                match code {
                    Some(code) => err.with_detail("provider_code", code),
                    None => err,
                }
            }
            WhatsAppError::Http(ref inner) => {
                tracing::error!(error = %inner, "WhatsApp request failed");
                if inner.is_timeout() {
                    AppError::new(ErrorCode::TimeoutError)
                } else {
                    AppError::new(ErrorCode::NetworkError)
                }
            }
            WhatsAppError::UnexpectedResponse(ref body) => {
                tracing::error!(body = %body, "Unexpected WhatsApp response");
                AppError::new(ErrorCode::WhatsAppSendFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: AppError = WhatsAppError::InvalidPhone("12".into()).into();
        assert_eq!(err.code, ErrorCode::InvalidPhoneNumber);

        let err: AppError = WhatsAppError::Api {
            status: 400,
            code: Some(REENGAGEMENT_REQUIRED),
            message: "Re-engagement message".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::WhatsAppSessionExpired);

        let err: AppError = WhatsAppError::Api {
            status: 401,
            code: Some(190),
            message: "Invalid OAuth access token".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::WhatsAppSendFailed);
        assert_eq!(err.http_status(), http::StatusCode::BAD_GATEWAY);
    }
}
