//! Locations, hotels, activities and itineraries

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Activity, ActivityCreate, ActivityUpdate, Hotel, HotelCreate, HotelUpdate, Itinerary, ItineraryCreate,
    ItineraryDetail, ItineraryUpdate, Location, LocationCreate, LocationUpdate,
};
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::{catalog, itinerary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route(
            "/api/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .route("/api/hotels", get(list_hotels).post(create_hotel))
        .route("/api/hotels/{id}", get(get_hotel).put(update_hotel).delete(delete_hotel))
        .route("/api/activities", get(list_activities).post(create_activity))
        .route(
            "/api/activities/{id}",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/api/itineraries", get(list_itineraries).post(create_itinerary))
        .route(
            "/api/itineraries/{id}",
            get(get_itinerary).put(update_itinerary).delete(delete_itinerary),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ByLocation {
    pub location_id: Option<i64>,
}

// ── Locations ──

pub async fn list_locations(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<LocationQuery>,
) -> ApiResult<Vec<Location>> {
    actor.require(Permission::Read)?;
    let rows = catalog::list_locations(&state.pool, q.active_only)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_location(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Location> {
    actor.require(Permission::Read)?;
    let row = catalog::get_location(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::LocationNotFound, id)?))
}

pub async fn create_location(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<LocationCreate>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let location = catalog::create_location(&state.pool, &data).await?;
    tracing::info!(location_id = location.id, slug = %location.slug, "Location created");
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<LocationUpdate>,
) -> ApiResult<Location> {
    actor.require(Permission::CatalogWrite)?;
    let row = catalog::update_location(&state.pool, id, &data)
        .await
        .map_err(internal)?;
    Ok(Json(found(row, ErrorCode::LocationNotFound, id)?))
}

pub async fn delete_location(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::CatalogWrite)?;
    let removed = catalog::delete_location(&state.pool, id).await?;
    deleted(removed, ErrorCode::LocationNotFound, id)
}

// ── Hotels ──

pub async fn list_hotels(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<ByLocation>,
) -> ApiResult<Vec<Hotel>> {
    actor.require(Permission::Read)?;
    let rows = catalog::list_hotels(&state.pool, q.location_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_hotel(State(state): State<AppState>, actor: Actor, Path(id): Path<i64>) -> ApiResult<Hotel> {
    actor.require(Permission::Read)?;
    let row = catalog::get_hotel(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::HotelNotFound, id)?))
}

pub async fn create_hotel(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<HotelCreate>,
) -> Result<(StatusCode, Json<Hotel>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let hotel = catalog::create_hotel(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

pub async fn update_hotel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<HotelUpdate>,
) -> ApiResult<Hotel> {
    actor.require(Permission::CatalogWrite)?;
    let row = catalog::update_hotel(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::HotelNotFound, id)?))
}

pub async fn delete_hotel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::CatalogWrite)?;
    let removed = catalog::delete_hotel(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::HotelNotFound, id)
}

// ── Activities ──

pub async fn list_activities(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<ByLocation>,
) -> ApiResult<Vec<Activity>> {
    actor.require(Permission::Read)?;
    let rows = catalog::list_activities(&state.pool, q.location_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_activity(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Activity> {
    actor.require(Permission::Read)?;
    let row = catalog::get_activity(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::ActivityNotFound, id)?))
}

pub async fn create_activity(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<ActivityCreate>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let activity = catalog::create_activity(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update_activity(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<ActivityUpdate>,
) -> ApiResult<Activity> {
    actor.require(Permission::CatalogWrite)?;
    let row = catalog::update_activity(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::ActivityNotFound, id)?))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::CatalogWrite)?;
    let removed = catalog::delete_activity(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::ActivityNotFound, id)
}

// ── Itineraries ──

pub async fn list_itineraries(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<ByLocation>,
) -> ApiResult<Vec<Itinerary>> {
    actor.require(Permission::Read)?;
    let rows = itinerary::list(&state.pool, q.location_id).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_itinerary(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<ItineraryDetail> {
    actor.require(Permission::Read)?;
    let row = itinerary::get_detail(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::ItineraryNotFound, id)?))
}

pub async fn create_itinerary(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<ItineraryCreate>,
) -> Result<(StatusCode, Json<ItineraryDetail>), AppError> {
    actor.require(Permission::CatalogWrite)?;
    let detail = itinerary::create(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_itinerary(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<ItineraryUpdate>,
) -> ApiResult<ItineraryDetail> {
    actor.require(Permission::CatalogWrite)?;
    let row = itinerary::update(&state.pool, id, &data).await?;
    Ok(Json(found(row, ErrorCode::ItineraryNotFound, id)?))
}

pub async fn delete_itinerary(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::CatalogWrite)?;
    let removed = itinerary::delete(&state.pool, id).await.map_err(internal)?;
    deleted(removed, ErrorCode::ItineraryNotFound, id)
}
