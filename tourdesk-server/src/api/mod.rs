//! API routes for tourdesk-server

pub mod accounting;
pub mod catalog;
pub mod health;
pub mod inquiries;
pub mod ledgers;
pub mod packages;
pub mod parties;
pub mod public;
pub mod queries;
pub mod reports;
pub mod tds;
pub mod vouchers;
pub mod whatsapp;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{public_rate_limit, webhook_rate_limit};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!("Query error: {e}");
    AppError::new(ErrorCode::InternalError)
}

/// `None` from a lookup becomes the resource's not-found error
fn found<T>(value: Option<T>, code: ErrorCode, id: i64) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::new(code).with_detail("id", id))
}

/// 204 when a row was removed, not-found otherwise
fn deleted(removed: bool, code: ErrorCode, id: i64) -> Result<StatusCode, AppError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::new(code).with_detail("id", id))
    }
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Website / mobile client (no identity, per-IP limit)
    let public = Router::new()
        .route("/public/tour-packages", get(public::list_packages))
        .route("/public/tour-packages/{slug}", get(public::get_package))
        .route("/public/locations", get(public::list_locations))
        .layer(middleware::from_fn_with_state(state.clone(), public_rate_limit));

    // Provider webhook (signature-verified, raw body)
    let webhook = Router::new()
        .route(
            "/webhooks/whatsapp",
            get(whatsapp::verify_webhook).post(whatsapp::receive_webhook),
        )
        .layer(middleware::from_fn_with_state(state.clone(), webhook_rate_limit));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(catalog::router())
        .merge(packages::router())
        .merge(inquiries::router())
        .merge(queries::router())
        .merge(parties::router())
        .merge(accounting::router())
        .merge(vouchers::router())
        .merge(ledgers::router())
        .merge(tds::router())
        .merge(reports::router())
        .merge(whatsapp::router())
        .merge(public)
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
