//! Customers, suppliers, associate partners and operational staff

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AssociatePartner, AssociatePartnerCreate, AssociatePartnerUpdate, Customer, CustomerCreate,
    CustomerUpdate, OperationalStaff, OperationalStaffCreate, OperationalStaffUpdate, Supplier,
    SupplierCreate, SupplierUpdate,
};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::parties;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/api/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/api/associate-partners", get(list_partners).post(create_partner))
        .route(
            "/api/associate-partners/{id}",
            get(get_partner).put(update_partner).delete(delete_partner),
        )
        .route("/api/operational-staff", get(list_staff).post(create_staff))
        .route(
            "/api/operational-staff/{id}",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// ── Customers ──

pub async fn list_customers(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Vec<Customer>> {
    actor.require(Permission::Read)?;
    let rows = parties::list_customers(&state.pool, q.search.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_customer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Customer> {
    actor.require(Permission::Read)?;
    let row = parties::get_customer(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::CustomerNotFound, id)?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<CustomerCreate>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    actor.require(Permission::QueriesWrite)?;
    let created = parties::create_customer(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<CustomerUpdate>,
) -> ApiResult<Customer> {
    actor.require(Permission::QueriesWrite)?;
    let row = parties::update_customer(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::CustomerNotFound, id)?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::QueriesWrite)?;
    let removed = parties::delete_customer(&state.pool, id).await?;
    deleted(removed, ErrorCode::CustomerNotFound, id)
}

// ── Suppliers ──

pub async fn list_suppliers(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Vec<Supplier>> {
    actor.require(Permission::AccountingRead)?;
    let rows = parties::list_suppliers(&state.pool, q.search.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Supplier> {
    actor.require(Permission::AccountingRead)?;
    let row = parties::get_supplier(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::SupplierNotFound, id)?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<SupplierCreate>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    actor.require(Permission::AccountingWrite)?;
    let created = parties::create_supplier(&state.pool, &data).await?;
    tracing::info!(supplier_id = created.id, name = %created.name, "Supplier created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<SupplierUpdate>,
) -> ApiResult<Supplier> {
    actor.require(Permission::AccountingWrite)?;
    let row = parties::update_supplier(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::SupplierNotFound, id)?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::AccountingWrite)?;
    let removed = parties::delete_supplier(&state.pool, id).await?;
    deleted(removed, ErrorCode::SupplierNotFound, id)
}

// ── Associate partners ──

pub async fn list_partners(
    State(state): State<AppState>,
    actor: Actor,
) -> ApiResult<Vec<AssociatePartner>> {
    actor.require(Permission::Read)?;
    let rows = parties::list_partners(&state.pool).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<AssociatePartner> {
    // A partner may read its own profile
    if actor.partner_id().is_none_or(|own| own != id) {
        actor.require(Permission::Read)?;
    }
    let row = parties::get_partner(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::PartnerNotFound, id)?))
}

pub async fn create_partner(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<AssociatePartnerCreate>,
) -> Result<(StatusCode, Json<AssociatePartner>), AppError> {
    actor.require(Permission::StaffManage)?;
    let created = parties::create_partner(&state.pool, &data).await?;
    tracing::info!(partner_id = created.id, name = %created.name, "Associate partner created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<AssociatePartnerUpdate>,
) -> ApiResult<AssociatePartner> {
    actor.require(Permission::StaffManage)?;
    let row = parties::update_partner(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::PartnerNotFound, id)?))
}

pub async fn delete_partner(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::StaffManage)?;
    let removed = parties::delete_partner(&state.pool, id).await?;
    deleted(removed, ErrorCode::PartnerNotFound, id)
}

// ── Operational staff ──

#[derive(Debug, Default, Deserialize)]
pub struct StaffQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list_staff(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<StaffQuery>,
) -> ApiResult<Vec<OperationalStaff>> {
    actor.require(Permission::Read)?;
    let rows = parties::list_staff(&state.pool, q.active_only)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<OperationalStaff> {
    actor.require(Permission::Read)?;
    let row = parties::get_staff(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::StaffNotFound, id)?))
}

pub async fn create_staff(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<OperationalStaffCreate>,
) -> Result<(StatusCode, Json<OperationalStaff>), AppError> {
    actor.require(Permission::StaffManage)?;
    let created = parties::create_staff(&state.pool, &data).await?;
    tracing::info!(staff_id = created.id, role = %created.role, "Operational staff created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<OperationalStaffUpdate>,
) -> ApiResult<OperationalStaff> {
    actor.require(Permission::StaffManage)?;
    let row = parties::update_staff(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::StaffNotFound, id)?))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::StaffManage)?;
    let removed = parties::delete_staff(&state.pool, id).await?;
    deleted(removed, ErrorCode::StaffNotFound, id)
}
