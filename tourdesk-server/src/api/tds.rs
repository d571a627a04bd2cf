//! TDS sections, previews, deductions and challan deposits

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{TdsDeposit, TdsTransaction};
use shared::roles::Permission;
use shared::tds::{SECTIONS, TdsComputation, TdsInput, TdsSection, compute_tds};

use super::{ApiResult, found, internal};
use crate::auth::Actor;
use crate::db::tds::{self, TdsFilter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tds/sections", get(sections))
        .route("/api/tds/compute", post(compute))
        .route("/api/tds/transactions", get(list_transactions))
        .route("/api/tds/transactions/{id}", get(get_transaction))
        .route("/api/tds/transactions/{id}/deposit", post(deposit))
}

/// GET /api/tds/sections - the rate master
pub async fn sections(actor: Actor) -> ApiResult<&'static [TdsSection]> {
    actor.require(Permission::AccountingRead)?;
    Ok(Json(SECTIONS))
}

/// POST /api/tds/compute - preview without recording anything
pub async fn compute(actor: Actor, Json(input): Json<TdsInput>) -> ApiResult<TdsComputation> {
    actor.require(Permission::AccountingRead)?;
    Ok(Json(compute_tds(&input).map_err(AppError::from)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct TdsQuery {
    /// "2025-26"
    pub fy: Option<String>,
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub pending: bool,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<TdsQuery>,
) -> ApiResult<Vec<TdsTransaction>> {
    actor.require(Permission::AccountingRead)?;
    let filter = TdsFilter {
        financial_year: q.fy.as_deref(),
        supplier_id: q.supplier_id,
        pending_only: q.pending,
    };
    Ok(Json(tds::list_transactions(&state.pool, filter).await?))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<TdsTransaction> {
    actor.require(Permission::AccountingRead)?;
    let row = tds::get_transaction(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::TdsTransactionNotFound, id)?))
}

/// POST /api/tds/transactions/{id}/deposit - record the challan
pub async fn deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<TdsDeposit>,
) -> ApiResult<TdsTransaction> {
    actor.require(Permission::AccountingWrite)?;
    let row = tds::deposit(&state.pool, id, &data).await?;
    tracing::info!(tds_id = id, challan = ?row.challan_number, "TDS deposited");
    Ok(Json(row))
}
