//! Purchases, sales and returns

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DocumentKind, PurchaseCreate, PurchaseDetail, PurchaseReturn, PurchaseUpdate, PurchaseWithItems,
    ReturnCreate, ReturnWithItems, SaleCreate, SaleDetail, SaleReturn, SaleUpdate, SaleWithItems,
};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::documents::{self, DocumentFilter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/purchases", get(list_purchases).post(create_purchase))
        .route(
            "/api/purchases/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
        .route("/api/sales", get(list_sales).post(create_sale))
        .route("/api/sales/{id}", get(get_sale).put(update_sale).delete(delete_sale))
        .route(
            "/api/purchase-returns",
            get(list_purchase_returns).post(create_purchase_return),
        )
        .route(
            "/api/purchase-returns/{id}",
            get(get_purchase_return).delete(delete_purchase_return),
        )
        .route("/api/sale-returns", get(list_sale_returns).post(create_sale_return))
        .route(
            "/api/sale-returns/{id}",
            get(get_sale_return).delete(delete_sale_return),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    pub party_id: Option<i64>,
    /// YYYY-MM-DD, inclusive
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DocumentQuery {
    fn filter(&self) -> DocumentFilter<'_> {
        DocumentFilter {
            party_id: self.party_id,
            from: self.from.as_deref(),
            to: self.to.as_deref(),
        }
    }
}

// ── Purchases ──

pub async fn list_purchases(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<DocumentQuery>,
) -> ApiResult<Vec<PurchaseDetail>> {
    actor.require(Permission::AccountingRead)?;
    let rows = documents::list_purchases(&state.pool, q.filter())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<PurchaseWithItems> {
    actor.require(Permission::AccountingRead)?;
    let row = documents::get_purchase(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::PurchaseNotFound, id)?))
}

pub async fn create_purchase(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<PurchaseCreate>,
) -> Result<(StatusCode, Json<PurchaseWithItems>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = documents::create_purchase(&state.pool, &state.company.state_code, &data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_purchase(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<PurchaseUpdate>,
) -> ApiResult<PurchaseWithItems> {
    actor.require(Permission::AccountingWrite)?;
    let updated = documents::update_purchase(&state.pool, &state.company.state_code, id, &data).await?;
    Ok(Json(updated))
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = documents::delete_purchase(&state.pool, id)
        .await
        .map_err(internal)?;
    deleted(removed, ErrorCode::PurchaseNotFound, id)
}

// ── Sales ──

pub async fn list_sales(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<DocumentQuery>,
) -> ApiResult<Vec<SaleDetail>> {
    actor.require(Permission::AccountingRead)?;
    let rows = documents::list_sales(&state.pool, q.filter())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_sale(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<SaleWithItems> {
    actor.require(Permission::AccountingRead)?;
    let row = documents::get_sale(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::SaleNotFound, id)?))
}

pub async fn create_sale(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<SaleCreate>,
) -> Result<(StatusCode, Json<SaleWithItems>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = documents::create_sale(&state.pool, &state.company.state_code, &data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_sale(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<SaleUpdate>,
) -> ApiResult<SaleWithItems> {
    actor.require(Permission::AccountingWrite)?;
    let updated = documents::update_sale(&state.pool, &state.company.state_code, id, &data).await?;
    Ok(Json(updated))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = documents::delete_sale(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::SaleNotFound, id)
}

// ── Returns ──

pub async fn list_purchase_returns(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<DocumentQuery>,
) -> ApiResult<Vec<PurchaseReturn>> {
    actor.require(Permission::AccountingRead)?;
    let rows = documents::list_purchase_returns(&state.pool, q.filter())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_purchase_return(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<ReturnWithItems<PurchaseReturn>> {
    actor.require(Permission::AccountingRead)?;
    let row = documents::get_purchase_return(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(Json(found(row, ErrorCode::NotFound, id)?))
}

pub async fn create_purchase_return(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<ReturnCreate>,
) -> Result<(StatusCode, Json<ReturnWithItems<PurchaseReturn>>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created =
        documents::create_purchase_return(&state.pool, &state.company.state_code, &data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_purchase_return(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = documents::delete_return(&state.pool, DocumentKind::PurchaseReturn, id)
        .await
        .map_err(internal)?;
    deleted(removed, ErrorCode::NotFound, id)
}

pub async fn list_sale_returns(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<DocumentQuery>,
) -> ApiResult<Vec<SaleReturn>> {
    actor.require(Permission::AccountingRead)?;
    let rows = documents::list_sale_returns(&state.pool, q.filter())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_sale_return(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<ReturnWithItems<SaleReturn>> {
    actor.require(Permission::AccountingRead)?;
    let row = documents::get_sale_return(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(Json(found(row, ErrorCode::NotFound, id)?))
}

pub async fn create_sale_return(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<ReturnCreate>,
) -> Result<(StatusCode, Json<ReturnWithItems<SaleReturn>>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created =
        documents::create_sale_return(&state.pool, &state.company.state_code, &data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_sale_return(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = documents::delete_return(&state.pool, DocumentKind::SaleReturn, id)
        .await
        .map_err(internal)?;
    deleted(removed, ErrorCode::NotFound, id)
}
