//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer `AppError`, so handlers can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use tour_pdf::PdfError;

use crate::BoxError;

/// - `Db`: database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Map a PDF pipeline failure to the API error
pub fn pdf_error(e: PdfError) -> AppError {
    match e {
        PdfError::RateLimited { retry_after_secs } => {
            AppError::with_message(ErrorCode::RateLimited, e.to_string())
                .with_detail("retry_after_secs", retry_after_secs)
        }
        PdfError::Busy => AppError::new(ErrorCode::PdfRendererBusy),
        other => {
            tracing::error!(error = %other, "PDF render failed");
            AppError::new(ErrorCode::PdfRenderFailed)
        }
    }
}

/// Whether a sqlx error is a unique-constraint violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether a sqlx error is a foreign-key violation
pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_is_hidden() {
        let err: AppError = ServiceError::Db("connection reset".into()).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("connection reset"));
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = ServiceError::App(AppError::new(ErrorCode::QueryNotFound)).into();
        assert_eq!(err.code, ErrorCode::QueryNotFound);
    }

    #[test]
    fn test_pdf_error_mapping() {
        let err = pdf_error(PdfError::RateLimited { retry_after_secs: 12 });
        assert_eq!(err.code, ErrorCode::RateLimited);
        assert_eq!(err.http_status(), http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(pdf_error(PdfError::Busy).code, ErrorCode::PdfRendererBusy);
        assert_eq!(
            pdf_error(PdfError::Timeout(30)).code,
            ErrorCode::PdfRenderFailed
        );
    }
}
