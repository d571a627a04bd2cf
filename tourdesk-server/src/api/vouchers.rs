//! Payments, receipts, expenses, incomes and transfers
//!
//! Each kind has its own resource path; listing, lookup and deletion are
//! shared and keyed by [`VoucherKind`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CashFlowCreate, PaymentCreate, ReceiptCreate, TransferCreate, Voucher, VoucherKind};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::vouchers::{self, PaymentResult, VoucherFilter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/{id}", get(get_payment).delete(delete_payment))
        .route("/api/receipts", get(list_receipts).post(create_receipt))
        .route("/api/receipts/{id}", get(get_receipt).delete(delete_receipt))
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route("/api/expenses/{id}", get(get_expense).delete(delete_expense))
        .route("/api/incomes", get(list_incomes).post(create_income))
        .route("/api/incomes/{id}", get(get_income).delete(delete_income))
        .route("/api/transfers", get(list_transfers).post(create_transfer))
        .route("/api/transfers/{id}", get(get_transfer).delete(delete_transfer))
}

#[derive(Debug, Default, Deserialize)]
pub struct VoucherQuery {
    pub supplier_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

async fn list_kind(state: &AppState, actor: &Actor, kind: VoucherKind, q: &VoucherQuery) -> ApiResult<Vec<Voucher>> {
    actor.require(Permission::AccountingRead)?;
    let filter = VoucherFilter {
        supplier_id: q.supplier_id,
        customer_id: q.customer_id,
        from: q.from.as_deref(),
        to: q.to.as_deref(),
    };
    let rows = vouchers::list(&state.pool, kind, filter).await.map_err(internal)?;
    Ok(Json(rows))
}

async fn get_kind(state: &AppState, actor: &Actor, kind: VoucherKind, id: i64) -> ApiResult<Voucher> {
    actor.require(Permission::AccountingRead)?;
    let row = vouchers::get(&state.pool, kind, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::VoucherNotFound, id)?))
}

async fn delete_kind(state: &AppState, actor: &Actor, kind: VoucherKind, id: i64) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = vouchers::delete(&state.pool, kind, id).await?;
    if removed {
        tracing::info!(voucher_id = id, kind = kind.as_str(), "Voucher deleted");
    }
    deleted(removed, ErrorCode::VoucherNotFound, id)
}

// ── Payments ──

pub async fn list_payments(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<VoucherQuery>,
) -> ApiResult<Vec<Voucher>> {
    list_kind(&state, &actor, VoucherKind::Payment, &q).await
}

pub async fn get_payment(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Voucher> {
    get_kind(&state, &actor, VoucherKind::Payment, id).await
}

/// POST /api/payments - withholds TDS when the supplier or request names a section
pub async fn create_payment(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<PaymentCreate>,
) -> Result<(StatusCode, Json<PaymentResult>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let result = vouchers::create_payment(&state.pool, &data, actor.staff_id()).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_kind(&state, &actor, VoucherKind::Payment, id).await
}

// ── Receipts ──

pub async fn list_receipts(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<VoucherQuery>,
) -> ApiResult<Vec<Voucher>> {
    list_kind(&state, &actor, VoucherKind::Receipt, &q).await
}

pub async fn get_receipt(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Voucher> {
    get_kind(&state, &actor, VoucherKind::Receipt, id).await
}

pub async fn create_receipt(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<ReceiptCreate>,
) -> Result<(StatusCode, Json<Voucher>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = vouchers::create_receipt(&state.pool, &data, actor.staff_id()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_kind(&state, &actor, VoucherKind::Receipt, id).await
}

// ── Expenses / incomes ──

pub async fn list_expenses(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<VoucherQuery>,
) -> ApiResult<Vec<Voucher>> {
    list_kind(&state, &actor, VoucherKind::Expense, &q).await
}

pub async fn get_expense(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Voucher> {
    get_kind(&state, &actor, VoucherKind::Expense, id).await
}

pub async fn create_expense(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<CashFlowCreate>,
) -> Result<(StatusCode, Json<Voucher>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created =
        vouchers::create_cash_flow(&state.pool, VoucherKind::Expense, &data, actor.staff_id()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_kind(&state, &actor, VoucherKind::Expense, id).await
}

pub async fn list_incomes(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<VoucherQuery>,
) -> ApiResult<Vec<Voucher>> {
    list_kind(&state, &actor, VoucherKind::Income, &q).await
}

pub async fn get_income(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Voucher> {
    get_kind(&state, &actor, VoucherKind::Income, id).await
}

pub async fn create_income(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<CashFlowCreate>,
) -> Result<(StatusCode, Json<Voucher>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created =
        vouchers::create_cash_flow(&state.pool, VoucherKind::Income, &data, actor.staff_id()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_income(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_kind(&state, &actor, VoucherKind::Income, id).await
}

// ── Transfers ──

pub async fn list_transfers(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<VoucherQuery>,
) -> ApiResult<Vec<Voucher>> {
    list_kind(&state, &actor, VoucherKind::Transfer, &q).await
}

pub async fn get_transfer(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Voucher> {
    get_kind(&state, &actor, VoucherKind::Transfer, id).await
}

pub async fn create_transfer(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<TransferCreate>,
) -> Result<(StatusCode, Json<Voucher>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = vouchers::create_transfer(&state.pool, &data, actor.staff_id()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_transfer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_kind(&state, &actor, VoucherKind::Transfer, id).await
}
