//! Website endpoints (no caller identity)

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Location, PublicTourPackage, TourPackageDetail};

use super::{ApiResult, internal};
use crate::db::{catalog, tour_package};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PublicPackageQuery {
    /// Location slug
    pub location: Option<String>,
}

/// GET /public/tour-packages
pub async fn list_packages(
    State(state): State<AppState>,
    Query(q): Query<PublicPackageQuery>,
) -> ApiResult<Vec<PublicTourPackage>> {
    let rows = tour_package::list_public(&state.pool, q.location.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

/// GET /public/tour-packages/{slug}
pub async fn get_package(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<TourPackageDetail> {
    let row = tour_package::get_public(&state.pool, &slug)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TourPackageNotFound).with_detail("slug", slug))?;
    Ok(Json(row))
}

/// GET /public/locations
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    let rows = catalog::list_locations(&state.pool, true).await.map_err(internal)?;
    Ok(Json(rows))
}
