//! tourdesk-server: tour operator back office
//!
//! JSON API for the back-office frontend plus a few public endpoints for the
//! website:
//! - Catalog authoring (locations, hotels, activities, itineraries, packages)
//! - Inquiries and tour package queries (quotations, PDF export)
//! - Accounting (purchases, sales, returns, vouchers, bank/cash ledgers, TDS)
//! - WhatsApp Cloud API messaging, webhooks and campaigns

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod quote;
pub mod state;
pub mod whatsapp;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Initialize tracing; `LOG_FORMAT=json` switches to JSON lines
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tourdesk_server=info,tour_pdf=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
