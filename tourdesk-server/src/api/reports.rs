//! Outstanding balances and the TDS summary

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::AppError;
use shared::ledger::PartyBalance;
use shared::models::TdsSummaryRow;
use shared::roles::Permission;

use super::{ApiResult, internal};
use crate::auth::Actor;
use crate::db::{reports, tds};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/customer-outstanding", get(customer_outstanding))
        .route("/api/reports/supplier-outstanding", get(supplier_outstanding))
        .route("/api/reports/tds-summary", get(tds_summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct OutstandingQuery {
    /// Also list parties whose balance is zero
    #[serde(default)]
    pub include_settled: bool,
}

pub async fn customer_outstanding(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<OutstandingQuery>,
) -> ApiResult<Vec<PartyBalance>> {
    actor.require(Permission::ReportsView)?;
    let rows = reports::customer_outstanding(&state.pool, q.include_settled)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn supplier_outstanding(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<OutstandingQuery>,
) -> ApiResult<Vec<PartyBalance>> {
    actor.require(Permission::ReportsView)?;
    let rows = reports::supplier_outstanding(&state.pool, q.include_settled)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct TdsSummaryQuery {
    pub fy: Option<String>,
}

pub async fn tds_summary(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<TdsSummaryQuery>,
) -> ApiResult<Vec<TdsSummaryRow>> {
    actor.require(Permission::ReportsView)?;
    let fy = q.fy.ok_or_else(|| AppError::required("fy"))?;
    Ok(Json(tds::summary(&state.pool, &fy).await?))
}
