//! Unified error codes for TourDesk
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Catalog errors (locations, hotels, activities, itineraries, packages)
//! - 4xxx: Inquiry and quotation errors
//! - 5xxx: Accounting errors (purchases, sales, returns, TDS)
//! - 6xxx: Ledger errors (bank and cash accounts)
//! - 7xxx: Messaging errors (WhatsApp)
//! - 8xxx: Party errors (customers, suppliers, partners, staff)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests
    RateLimited = 9,

    // ==================== 1xxx: Auth ====================
    /// Caller identity missing
    NotAuthenticated = 1001,
    /// Caller identity headers malformed
    IdentityInvalid = 1002,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Partner may only access own records
    PartnerScopeViolation = 2004,

    // ==================== 3xxx: Catalog ====================
    /// Location not found
    LocationNotFound = 3001,
    /// Location still referenced by hotels/packages
    LocationInUse = 3002,
    /// Hotel not found
    HotelNotFound = 3101,
    /// Activity not found
    ActivityNotFound = 3201,
    /// Itinerary not found
    ItineraryNotFound = 3301,
    /// Itinerary day numbers are not contiguous
    ItineraryDaysInvalid = 3302,
    /// Tour package not found
    TourPackageNotFound = 3401,
    /// Tour package slug already exists
    TourPackageSlugExists = 3402,
    /// Tour package is archived
    TourPackageArchived = 3403,

    // ==================== 4xxx: Inquiry / Query ====================
    /// Inquiry not found
    InquiryNotFound = 4001,
    /// Inquiry is already closed
    InquiryClosed = 4002,
    /// Invalid inquiry status transition
    InquiryStatusInvalid = 4003,
    /// Tour package query not found
    QueryNotFound = 4101,
    /// Tour package query already confirmed
    QueryAlreadyConfirmed = 4102,
    /// Tour package query has no price breakdown
    QueryNotPriced = 4103,
    /// Discount exceeds the quotation value
    QueryDiscountTooLarge = 4104,

    // ==================== 5xxx: Accounting ====================
    /// Purchase not found
    PurchaseNotFound = 5001,
    /// Sale not found
    SaleNotFound = 5002,
    /// Return exceeds returnable amount
    ReturnExceedsOriginal = 5003,
    /// Document has no line items
    DocumentEmpty = 5004,
    /// Amount must be positive
    AmountNotPositive = 5005,
    /// Voucher (payment/receipt/expense/income/transfer) not found
    VoucherNotFound = 5006,
    /// TDS section unknown
    TdsSectionUnknown = 5101,
    /// TDS transaction not found
    TdsTransactionNotFound = 5102,
    /// TDS already deposited
    TdsAlreadyDeposited = 5103,

    // ==================== 6xxx: Ledger ====================
    /// Bank account not found
    BankAccountNotFound = 6001,
    /// Cash account not found
    CashAccountNotFound = 6002,
    /// Transfer source equals destination
    TransferSameAccount = 6004,
    /// Account has transactions and cannot be deleted
    LedgerAccountInUse = 6005,

    // ==================== 7xxx: Messaging ====================
    /// WhatsApp provider rejected the request
    WhatsAppSendFailed = 7001,
    /// Free-form text outside the 24-hour session window
    WhatsAppSessionExpired = 7002,
    /// Invalid phone number
    InvalidPhoneNumber = 7003,
    /// Webhook signature mismatch
    WebhookSignatureInvalid = 7004,
    /// Campaign not found
    CampaignNotFound = 7101,
    /// Campaign has no recipients
    CampaignEmpty = 7102,
    /// WhatsApp integration not configured
    WhatsAppNotConfigured = 7103,

    // ==================== 8xxx: Parties ====================
    /// Customer not found
    CustomerNotFound = 8001,
    /// Supplier not found
    SupplierNotFound = 8002,
    /// Associate partner not found
    PartnerNotFound = 8003,
    /// Operational staff not found
    StaffNotFound = 8004,
    /// Staff email already exists
    StaffEmailExists = 8005,
    /// Party has accounting documents and cannot be deleted
    PartyInUse = 8006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// PDF renderer failed
    PdfRenderFailed = 9101,
    /// PDF renderer busy
    PdfRendererBusy = 9102,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::RateLimited => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::IdentityInvalid => "Caller identity is malformed",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::PartnerScopeViolation => "Partners may only access their own records",

            // Catalog
            ErrorCode::LocationNotFound => "Location not found",
            ErrorCode::LocationInUse => "Location is referenced by hotels or packages",
            ErrorCode::HotelNotFound => "Hotel not found",
            ErrorCode::ActivityNotFound => "Activity not found",
            ErrorCode::ItineraryNotFound => "Itinerary not found",
            ErrorCode::ItineraryDaysInvalid => "Itinerary days must be numbered 1..n",
            ErrorCode::TourPackageNotFound => "Tour package not found",
            ErrorCode::TourPackageSlugExists => "Tour package slug already exists",
            ErrorCode::TourPackageArchived => "Tour package is archived",

            // Inquiry / Query
            ErrorCode::InquiryNotFound => "Inquiry not found",
            ErrorCode::InquiryClosed => "Inquiry is already closed",
            ErrorCode::InquiryStatusInvalid => "Invalid inquiry status transition",
            ErrorCode::QueryNotFound => "Tour package query not found",
            ErrorCode::QueryAlreadyConfirmed => "Tour package query is already confirmed",
            ErrorCode::QueryNotPriced => "Tour package query has not been priced",
            ErrorCode::QueryDiscountTooLarge => "Discount exceeds quotation value",

            // Accounting
            ErrorCode::PurchaseNotFound => "Purchase not found",
            ErrorCode::SaleNotFound => "Sale not found",
            ErrorCode::ReturnExceedsOriginal => "Return exceeds the returnable amount",
            ErrorCode::DocumentEmpty => "Document has no line items",
            ErrorCode::AmountNotPositive => "Amount must be greater than zero",
            ErrorCode::VoucherNotFound => "Voucher not found",
            ErrorCode::TdsSectionUnknown => "Unknown TDS section",
            ErrorCode::TdsTransactionNotFound => "TDS transaction not found",
            ErrorCode::TdsAlreadyDeposited => "TDS has already been deposited",

            // Ledger
            ErrorCode::BankAccountNotFound => "Bank account not found",
            ErrorCode::CashAccountNotFound => "Cash account not found",
            ErrorCode::TransferSameAccount => "Transfer source and destination are the same",
            ErrorCode::LedgerAccountInUse => "Account has transactions",

            // Messaging
            ErrorCode::WhatsAppSendFailed => "WhatsApp message could not be sent",
            ErrorCode::WhatsAppSessionExpired => {
                "Free-form messages require a customer reply within 24 hours; use a template"
            }
            ErrorCode::InvalidPhoneNumber => "Invalid phone number",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature mismatch",
            ErrorCode::CampaignNotFound => "Campaign not found",
            ErrorCode::CampaignEmpty => "Campaign has no recipients",
            ErrorCode::WhatsAppNotConfigured => "WhatsApp integration is not configured",

            // Parties
            ErrorCode::CustomerNotFound => "Customer not found",
            ErrorCode::SupplierNotFound => "Supplier not found",
            ErrorCode::PartnerNotFound => "Associate partner not found",
            ErrorCode::StaffNotFound => "Operational staff not found",
            ErrorCode::StaffEmailExists => "Staff email already exists",
            ErrorCode::PartyInUse => "Party has accounting documents",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::PdfRenderFailed => "PDF rendering failed",
            ErrorCode::PdfRendererBusy => "PDF renderer is busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::RateLimited),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::IdentityInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::PartnerScopeViolation),

            // Catalog
            3001 => Ok(ErrorCode::LocationNotFound),
            3002 => Ok(ErrorCode::LocationInUse),
            3101 => Ok(ErrorCode::HotelNotFound),
            3201 => Ok(ErrorCode::ActivityNotFound),
            3301 => Ok(ErrorCode::ItineraryNotFound),
            3302 => Ok(ErrorCode::ItineraryDaysInvalid),
            3401 => Ok(ErrorCode::TourPackageNotFound),
            3402 => Ok(ErrorCode::TourPackageSlugExists),
            3403 => Ok(ErrorCode::TourPackageArchived),

            // Inquiry / Query
            4001 => Ok(ErrorCode::InquiryNotFound),
            4002 => Ok(ErrorCode::InquiryClosed),
            4003 => Ok(ErrorCode::InquiryStatusInvalid),
            4101 => Ok(ErrorCode::QueryNotFound),
            4102 => Ok(ErrorCode::QueryAlreadyConfirmed),
            4103 => Ok(ErrorCode::QueryNotPriced),
            4104 => Ok(ErrorCode::QueryDiscountTooLarge),

            // Accounting
            5001 => Ok(ErrorCode::PurchaseNotFound),
            5002 => Ok(ErrorCode::SaleNotFound),
            5003 => Ok(ErrorCode::ReturnExceedsOriginal),
            5004 => Ok(ErrorCode::DocumentEmpty),
            5005 => Ok(ErrorCode::AmountNotPositive),
            5006 => Ok(ErrorCode::VoucherNotFound),
            5101 => Ok(ErrorCode::TdsSectionUnknown),
            5102 => Ok(ErrorCode::TdsTransactionNotFound),
            5103 => Ok(ErrorCode::TdsAlreadyDeposited),

            // Ledger
            6001 => Ok(ErrorCode::BankAccountNotFound),
            6002 => Ok(ErrorCode::CashAccountNotFound),
            6004 => Ok(ErrorCode::TransferSameAccount),
            6005 => Ok(ErrorCode::LedgerAccountInUse),

            // Messaging
            7001 => Ok(ErrorCode::WhatsAppSendFailed),
            7002 => Ok(ErrorCode::WhatsAppSessionExpired),
            7003 => Ok(ErrorCode::InvalidPhoneNumber),
            7004 => Ok(ErrorCode::WebhookSignatureInvalid),
            7101 => Ok(ErrorCode::CampaignNotFound),
            7102 => Ok(ErrorCode::CampaignEmpty),
            7103 => Ok(ErrorCode::WhatsAppNotConfigured),

            // Parties
            8001 => Ok(ErrorCode::CustomerNotFound),
            8002 => Ok(ErrorCode::SupplierNotFound),
            8003 => Ok(ErrorCode::PartnerNotFound),
            8004 => Ok(ErrorCode::StaffNotFound),
            8005 => Ok(ErrorCode::StaffEmailExists),
            8006 => Ok(ErrorCode::PartyInUse),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9101 => Ok(ErrorCode::PdfRenderFailed),
            9102 => Ok(ErrorCode::PdfRendererBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::RateLimited.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::TourPackageNotFound.code(), 3401);
        assert_eq!(ErrorCode::QueryNotFound.code(), 4101);
        assert_eq!(ErrorCode::TdsSectionUnknown.code(), 5101);
        assert_eq!(ErrorCode::BankAccountNotFound.code(), 6001);
        assert_eq!(ErrorCode::WhatsAppSessionExpired.code(), 7002);
        assert_eq!(ErrorCode::SupplierNotFound.code(), 8002);
        assert_eq!(ErrorCode::PdfRenderFailed.code(), 9101);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }

    #[test]
    fn test_try_from_round_trips_every_code() {
        let all = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::RequiredField,
            ErrorCode::ValueOutOfRange,
            ErrorCode::RateLimited,
            ErrorCode::NotAuthenticated,
            ErrorCode::IdentityInvalid,
            ErrorCode::PermissionDenied,
            ErrorCode::RoleRequired,
            ErrorCode::AdminRequired,
            ErrorCode::PartnerScopeViolation,
            ErrorCode::LocationNotFound,
            ErrorCode::LocationInUse,
            ErrorCode::HotelNotFound,
            ErrorCode::ActivityNotFound,
            ErrorCode::ItineraryNotFound,
            ErrorCode::ItineraryDaysInvalid,
            ErrorCode::TourPackageNotFound,
            ErrorCode::TourPackageSlugExists,
            ErrorCode::TourPackageArchived,
            ErrorCode::InquiryNotFound,
            ErrorCode::InquiryClosed,
            ErrorCode::InquiryStatusInvalid,
            ErrorCode::QueryNotFound,
            ErrorCode::QueryAlreadyConfirmed,
            ErrorCode::QueryNotPriced,
            ErrorCode::QueryDiscountTooLarge,
            ErrorCode::PurchaseNotFound,
            ErrorCode::SaleNotFound,
            ErrorCode::ReturnExceedsOriginal,
            ErrorCode::DocumentEmpty,
            ErrorCode::AmountNotPositive,
            ErrorCode::VoucherNotFound,
            ErrorCode::TdsSectionUnknown,
            ErrorCode::TdsTransactionNotFound,
            ErrorCode::TdsAlreadyDeposited,
            ErrorCode::BankAccountNotFound,
            ErrorCode::CashAccountNotFound,
            ErrorCode::TransferSameAccount,
            ErrorCode::LedgerAccountInUse,
            ErrorCode::WhatsAppSendFailed,
            ErrorCode::WhatsAppSessionExpired,
            ErrorCode::InvalidPhoneNumber,
            ErrorCode::WebhookSignatureInvalid,
            ErrorCode::CampaignNotFound,
            ErrorCode::CampaignEmpty,
            ErrorCode::WhatsAppNotConfigured,
            ErrorCode::CustomerNotFound,
            ErrorCode::SupplierNotFound,
            ErrorCode::PartnerNotFound,
            ErrorCode::StaffNotFound,
            ErrorCode::StaffEmailExists,
            ErrorCode::PartyInUse,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::NetworkError,
            ErrorCode::TimeoutError,
            ErrorCode::PdfRenderFailed,
            ErrorCode::PdfRendererBusy,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        // Codes nothing raises are not part of the table
        assert_eq!(ErrorCode::try_from(9201), Err(InvalidErrorCode(9201)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::QueryNotFound).unwrap();
        assert_eq!(json, "4101");
        let code: ErrorCode = serde_json::from_str("7002").unwrap();
        assert_eq!(code, ErrorCode::WhatsAppSessionExpired);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }
}
