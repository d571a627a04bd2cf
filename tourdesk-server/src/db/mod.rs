//! Database access layer
//!
//! Free async functions per table. Single-row reads/writes return
//! `Result<_, BoxError>`; multi-row writes run in one transaction and return
//! `ServiceResult` so business-rule failures can abort them.

pub mod catalog;
pub mod documents;
pub mod inquiry;
pub mod itinerary;
pub mod ledger;
pub mod parties;
pub mod query;
pub mod reports;
pub mod tds;
pub mod tour_package;
pub mod vouchers;
pub mod whatsapp;

pub(crate) use crate::BoxError;

use chrono::NaiveDate;
use shared::error::{AppError, ErrorCode};

/// Parse a required `YYYY-MM-DD` field
pub(crate) fn require_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    shared::util::parse_date(value.trim()).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidFormat, format!("{field} must be YYYY-MM-DD"))
            .with_detail("field", field)
    })
}
