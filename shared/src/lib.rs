//! Shared types for TourDesk
//!
//! Domain models, the unified error system and the pure business rules
//! (TDS, ledgers, invoices, quote pricing, roles) used by the server.

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod money;
pub mod pricing;
pub mod roles;
pub mod tds;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use roles::Role;
