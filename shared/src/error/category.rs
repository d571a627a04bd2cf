//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Catalog errors (3xxx)
    Catalog,
    /// Inquiry and quotation errors (4xxx)
    Sales,
    /// Accounting errors (5xxx)
    Accounting,
    /// Ledger errors (6xxx)
    Ledger,
    /// Messaging errors (7xxx)
    Messaging,
    /// Party errors (8xxx)
    Party,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Catalog,
            4000..5000 => Self::Sales,
            5000..6000 => Self::Accounting,
            6000..7000 => Self::Ledger,
            7000..8000 => Self::Messaging,
            8000..9000 => Self::Party,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Catalog => "catalog",
            Self::Sales => "sales",
            Self::Accounting => "accounting",
            Self::Ledger => "ledger",
            Self::Messaging => "messaging",
            Self::Party => "party",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3401), ErrorCategory::Catalog);
        assert_eq!(ErrorCategory::from_code(4101), ErrorCategory::Sales);
        assert_eq!(ErrorCategory::from_code(5101), ErrorCategory::Accounting);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Ledger);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Messaging);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::Party);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::QueryNotPriced.category(), ErrorCategory::Sales);
        assert_eq!(
            ErrorCode::TdsAlreadyDeposited.category(),
            ErrorCategory::Accounting
        );
        assert_eq!(ErrorCode::PdfRenderFailed.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Messaging).unwrap();
        assert_eq!(json, "\"messaging\"");
        let category: ErrorCategory = serde_json::from_str("\"ledger\"").unwrap();
        assert_eq!(category, ErrorCategory::Ledger);
    }
}
