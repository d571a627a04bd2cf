//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::LocationNotFound
            | Self::HotelNotFound
            | Self::ActivityNotFound
            | Self::ItineraryNotFound
            | Self::TourPackageNotFound
            | Self::InquiryNotFound
            | Self::QueryNotFound
            | Self::PurchaseNotFound
            | Self::SaleNotFound
            | Self::VoucherNotFound
            | Self::TdsTransactionNotFound
            | Self::BankAccountNotFound
            | Self::CashAccountNotFound
            | Self::CampaignNotFound
            | Self::CustomerNotFound
            | Self::SupplierNotFound
            | Self::PartnerNotFound
            | Self::StaffNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::LocationInUse
            | Self::TourPackageSlugExists
            | Self::InquiryClosed
            | Self::QueryAlreadyConfirmed
            | Self::TdsAlreadyDeposited
            | Self::LedgerAccountInUse
            | Self::StaffEmailExists
            | Self::PartyInUse => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::IdentityInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::AdminRequired
            | Self::PartnerScopeViolation
            | Self::WebhookSignatureInvalid => StatusCode::FORBIDDEN,

            // 422 Unprocessable (business rules on well-formed input)
            Self::WhatsAppSessionExpired
            | Self::ReturnExceedsOriginal
            | Self::QueryDiscountTooLarge
            | Self::QueryNotPriced
            | Self::TourPackageArchived => StatusCode::UNPROCESSABLE_ENTITY,

            // 429 Too Many Requests
            Self::RateLimited | Self::PdfRendererBusy => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway (upstream provider rejected)
            Self::WhatsAppSendFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::WhatsAppNotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::PdfRenderFailed
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::QueryNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::BankAccountNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::TourPackageSlugExists.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::TdsAlreadyDeposited.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_and_permission_status() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::RoleRequired.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::WebhookSignatureInvalid.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rate_limited_status() {
        assert_eq!(
            ErrorCode::RateLimited.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::PdfRendererBusy.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_bad_request_default() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::AmountNotPositive.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InvalidPhoneNumber.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
