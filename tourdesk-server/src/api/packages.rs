//! Tour packages

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{TourPackage, TourPackageCreate, TourPackageDetail, TourPackageUpdate};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::tour_package::{self, PackageFilter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tour-packages", get(list).post(create))
        .route("/api/tour-packages/{id}", get(get_by_id).put(update).delete(delete))
        .route("/api/tour-packages/{id}/duplicate", post(duplicate))
}

#[derive(Debug, Default, Deserialize)]
pub struct PackageQuery {
    pub location_id: Option<i64>,
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<PackageQuery>,
) -> ApiResult<Vec<TourPackage>> {
    actor.require(Permission::Read)?;
    let filter = PackageFilter {
        location_id: q.location_id,
        include_archived: q.include_archived,
    };
    let rows = tour_package::list(&state.pool, filter).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<TourPackageDetail> {
    actor.require(Permission::Read)?;
    let row = tour_package::get_detail(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::TourPackageNotFound, id)?))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<TourPackageCreate>,
) -> Result<(StatusCode, Json<TourPackageDetail>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let detail = tour_package::create(&state.pool, &data).await?;
    tracing::info!(package_id = detail.package.id, slug = %detail.package.slug, "Tour package created");
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<TourPackageUpdate>,
) -> ApiResult<TourPackageDetail> {
    actor.require(Permission::CatalogWrite)?;
    let row = tour_package::update(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::TourPackageNotFound, id)?))
}

pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::CatalogWrite)?;
    let removed = tour_package::delete(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::TourPackageNotFound, id)
}

/// POST /api/tour-packages/{id}/duplicate - unpublished copy with a fresh slug
pub async fn duplicate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<TourPackageDetail>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let copy = tour_package::duplicate(&state.pool, id).await?;
    let copy = found(copy, ErrorCode::TourPackageNotFound, id)?;
    tracing::info!(source_id = id, package_id = copy.package.id, "Tour package duplicated");
    Ok((StatusCode::CREATED, Json(copy)))
}
