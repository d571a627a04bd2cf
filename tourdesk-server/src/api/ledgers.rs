//! Bank and cash accounts, statements and balance recalculation

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AccountRef, BankAccount, BankAccountCreate, BankAccountUpdate, CashAccount, CashAccountCreate,
    CashAccountUpdate,
};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::ledger::{self, AccountStatement};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bank-accounts", get(list_bank).post(create_bank))
        .route(
            "/api/bank-accounts/{id}",
            get(get_bank).put(update_bank).delete(delete_bank),
        )
        .route("/api/bank-accounts/{id}/statement", get(bank_statement))
        .route("/api/bank-accounts/{id}/recalculate", post(recalculate_bank))
        .route("/api/cash-accounts", get(list_cash).post(create_cash))
        .route(
            "/api/cash-accounts/{id}",
            get(get_cash).put(update_cash).delete(delete_cash),
        )
        .route("/api/cash-accounts/{id}/statement", get(cash_statement))
        .route("/api/cash-accounts/{id}/recalculate", post(recalculate_cash))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatementQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Recalculated {
    pub account: AccountRef,
    pub balance: f64,
}

async fn statement_for(
    state: &AppState,
    actor: &Actor,
    account: AccountRef,
    q: &StatementQuery,
) -> ApiResult<AccountStatement> {
    actor.require(Permission::AccountingRead)?;
    let statement =
        ledger::statement(&state.pool, account, q.from.as_deref(), q.to.as_deref()).await?;
    Ok(Json(statement))
}

async fn recalculate(state: &AppState, actor: &Actor, account: AccountRef) -> ApiResult<Recalculated> {
    actor.require(Permission::AccountingWrite)?;
    let balance = ledger::recalculate(&state.pool, account).await?;
    Ok(Json(Recalculated { account, balance }))
}

// ── Bank accounts ──

pub async fn list_bank(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<BankAccount>> {
    actor.require(Permission::AccountingRead)?;
    let rows = ledger::list_bank_accounts(&state.pool).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_bank(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<BankAccount> {
    actor.require(Permission::AccountingRead)?;
    let row = ledger::get_bank_account(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::BankAccountNotFound, id)?))
}

pub async fn create_bank(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<BankAccountCreate>,
) -> Result<(StatusCode, Json<BankAccount>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = ledger::create_bank_account(&state.pool, &data).await?;
    tracing::info!(account_id = created.id, "Bank account created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_bank(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<BankAccountUpdate>,
) -> ApiResult<BankAccount> {
    actor.require(Permission::AccountingWrite)?;
    let row = ledger::update_bank_account(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::BankAccountNotFound, id)?))
}

pub async fn delete_bank(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = ledger::delete_bank_account(&state.pool, id).await?;
    deleted(removed, ErrorCode::BankAccountNotFound, id)
}

pub async fn bank_statement(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(q): Query<StatementQuery>,
) -> ApiResult<AccountStatement> {
    statement_for(&state, &actor, AccountRef::bank(id), &q).await
}

pub async fn recalculate_bank(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Recalculated> {
    recalculate(&state, &actor, AccountRef::bank(id)).await
}

// ── Cash accounts ──

pub async fn list_cash(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<CashAccount>> {
    actor.require(Permission::AccountingRead)?;
    let rows = ledger::list_cash_accounts(&state.pool).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_cash(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<CashAccount> {
    actor.require(Permission::AccountingRead)?;
    let row = ledger::get_cash_account(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::CashAccountNotFound, id)?))
}

pub async fn create_cash(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<CashAccountCreate>,
) -> Result<(StatusCode, Json<CashAccount>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = ledger::create_cash_account(&state.pool, &data).await?;
    tracing::info!(account_id = created.id, "Cash account created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_cash(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<CashAccountUpdate>,
) -> ApiResult<CashAccount> {
    actor.require(Permission::AccountingWrite)?;
    let row = ledger::update_cash_account(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::CashAccountNotFound, id)?))
}

pub async fn delete_cash(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = ledger::delete_cash_account(&state.pool, id).await?;
    deleted(removed, ErrorCode::CashAccountNotFound, id)
}

pub async fn cash_statement(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(q): Query<StatementQuery>,
) -> ApiResult<AccountStatement> {
    statement_for(&state, &actor, AccountRef::cash(id), &q).await
}

pub async fn recalculate_cash(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Recalculated> {
    recalculate(&state, &actor, AccountRef::cash(id)).await
}
