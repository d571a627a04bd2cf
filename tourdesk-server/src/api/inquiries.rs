//! Inquiries and their assignment to operational staff

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Inquiry, InquiryAssign, InquiryCreate, InquiryStatusChange, InquiryUpdate};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::inquiry::{self, InquiryFilter};
use crate::email;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inquiries", get(list).post(create))
        .route("/api/inquiries/{id}", get(get_by_id).put(update).delete(delete))
        .route("/api/inquiries/{id}/assign", post(assign))
        .route("/api/inquiries/{id}/status", post(set_status))
        .route("/api/staff/me/inquiries", get(my_inquiries))
}

#[derive(Debug, Default, Deserialize)]
pub struct InquiryQuery {
    pub status: Option<String>,
    pub assigned_staff_id: Option<i64>,
    pub associate_partner_id: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<InquiryQuery>,
) -> ApiResult<Vec<Inquiry>> {
    actor.require(Permission::Read)?;
    let filter = InquiryFilter {
        status: q.status.as_deref(),
        assigned_staff_id: q.assigned_staff_id,
        associate_partner_id: q.associate_partner_id,
    };
    let rows = inquiry::list(&state.pool, filter).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Inquiry> {
    actor.require(Permission::Read)?;
    let row = inquiry::get(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::InquiryNotFound, id)?))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<InquiryCreate>,
) -> Result<(StatusCode, Json<Inquiry>), AppError> {
    actor.require(Permission::QueriesWrite)?;
    let created = inquiry::create(&state.pool, &data).await?;
    tracing::info!(inquiry_id = created.id, source = ?created.source, "Inquiry created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<InquiryUpdate>,
) -> ApiResult<Inquiry> {
    actor.require(Permission::QueriesWrite)?;
    Ok(Json(inquiry::update(&state.pool, id, &data).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::QueriesWrite)?;
    let removed = inquiry::delete(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::InquiryNotFound, id)
}

/// POST /api/inquiries/{id}/assign
///
/// The assignee is emailed in the background when notifications are enabled.
pub async fn assign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(req): Json<InquiryAssign>,
) -> ApiResult<Inquiry> {
    actor.require(Permission::StaffManage)?;
    let (assigned, staff) = inquiry::assign(&state.pool, id, req.staff_id).await?;
    tracing::info!(inquiry_id = id, staff_id = staff.id, by = ?actor.staff_id(), "Inquiry assigned");

    if let Some(ses) = state.ses.clone() {
        let from = state.ses_from_email.clone();
        let base_url = state.public_base_url.clone();
        let notified = assigned.clone();
        tokio::spawn(async move {
            if let Err(e) = email::send_inquiry_assigned(&ses, &from, &staff, &notified, &base_url).await {
                tracing::warn!(inquiry_id = notified.id, to = %staff.email, "Assignment email failed: {e}");
            }
        });
    }

    Ok(Json(assigned))
}

/// POST /api/inquiries/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(req): Json<InquiryStatusChange>,
) -> ApiResult<Inquiry> {
    actor.require(Permission::QueriesWrite)?;
    let updated = inquiry::set_status(&state.pool, id, req.status, req.note.as_deref()).await?;
    Ok(Json(updated))
}

/// GET /api/staff/me/inquiries - open work of the calling staff member
pub async fn my_inquiries(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<InquiryQuery>,
) -> ApiResult<Vec<Inquiry>> {
    actor.require(Permission::Read)?;
    let staff_id = actor
        .staff_id()
        .ok_or_else(|| AppError::new(ErrorCode::PartnerScopeViolation))?;
    let filter = InquiryFilter {
        status: q.status.as_deref(),
        assigned_staff_id: Some(staff_id),
        associate_partner_id: None,
    };
    let rows = inquiry::list(&state.pool, filter).await.map_err(internal)?;
    Ok(Json(rows))
}
