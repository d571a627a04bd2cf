//! Data models
//!
//! Shared between tourdesk-server and the back-office frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are snowflake `i64`; timestamps are Unix millis; dates are
//! `YYYY-MM-DD` strings.

pub mod activity;
pub mod associate_partner;
pub mod bank_account;
pub mod cash_account;
pub mod customer;
pub mod document;
pub mod hotel;
pub mod inquiry;
pub mod itinerary;
pub mod location;
pub mod operational_staff;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod supplier;
pub mod tds;
pub mod tour_package;
pub mod tour_package_query;
pub mod transaction;
pub mod whatsapp;

// Re-exports
pub use activity::*;
pub use associate_partner::*;
pub use bank_account::*;
pub use cash_account::*;
pub use customer::*;
pub use document::*;
pub use hotel::*;
pub use inquiry::*;
pub use itinerary::*;
pub use location::*;
pub use operational_staff::*;
pub use purchase::*;
pub use returns::*;
pub use sale::*;
pub use supplier::*;
pub use tds::*;
pub use tour_package::*;
pub use tour_package_query::*;
pub use transaction::*;
pub use whatsapp::*;
