//! Locations, hotels and activities

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Activity, ActivityCreate, ActivityUpdate, Hotel, HotelCreate, HotelUpdate, Location,
    LocationCreate, LocationUpdate,
};
use shared::util::{now_millis, slugify, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceResult, is_foreign_key_violation, is_unique_violation};

// ── Locations ──

const LOCATION_COLUMNS: &str =
    "id, name, slug, state, country, description, image_url, is_active, created_at, updated_at";

pub async fn list_locations(pool: &PgPool, active_only: bool) -> Result<Vec<Location>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE ($1 = FALSE OR is_active) ORDER BY name"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_location(pool: &PgPool, id: i64) -> Result<Option<Location>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_location(pool: &PgPool, data: &LocationCreate) -> ServiceResult<Location> {
    let slug = slugify(data.slug.as_deref().unwrap_or(&data.name));
    if slug.is_empty() {
        return Err(AppError::validation("Location name must contain letters or digits").into());
    }
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO locations (id, name, slug, state, country, description, image_url, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8)
        RETURNING {LOCATION_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&slug)
    .bind(&data.state)
    .bind(data.country.as_deref().unwrap_or("India"))
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::already_exists(format!("Location '{slug}'")).into()
        } else {
            crate::error::ServiceError::from(e)
        }
    })?;
    Ok(row)
}

pub async fn update_location(
    pool: &PgPool,
    id: i64,
    data: &LocationUpdate,
) -> Result<Option<Location>, BoxError> {
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE locations SET
            name = COALESCE($1, name),
            state = COALESCE($2, state),
            country = COALESCE($3, country),
            description = COALESCE($4, description),
            image_url = COALESCE($5, image_url),
            is_active = COALESCE($6, is_active),
            updated_at = $7
        WHERE id = $8
        RETURNING {LOCATION_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(&data.state)
    .bind(&data.country)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Delete a location no hotel, activity or package refers to
pub async fn delete_location(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    match sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
    {
        Ok(r) => Ok(r.rows_affected() > 0),
        Err(e) if is_foreign_key_violation(&e) => {
            Err(AppError::new(ErrorCode::LocationInUse).with_detail("location_id", id).into())
        }
        Err(e) => Err(e.into()),
    }
}

// ── Hotels ──

const HOTEL_COLUMNS: &str = "id, location_id, name, star_rating, address, phone, email, website, \
                             description, image_url, is_active, created_at, updated_at";

pub async fn list_hotels(pool: &PgPool, location_id: Option<i64>) -> Result<Vec<Hotel>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {HOTEL_COLUMNS} FROM hotels WHERE ($1::BIGINT IS NULL OR location_id = $1) ORDER BY name"
    ))
    .bind(location_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_hotel(pool: &PgPool, id: i64) -> Result<Option<Hotel>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_hotel(pool: &PgPool, data: &HotelCreate) -> ServiceResult<Hotel> {
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO hotels (id, location_id, name, star_rating, address, phone, email, website,
                            description, image_url, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11, $11)
        RETURNING {HOTEL_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.location_id)
    .bind(data.name.trim())
    .bind(data.star_rating)
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.website)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| location_fk(e, data.location_id))?;
    Ok(row)
}

pub async fn update_hotel(pool: &PgPool, id: i64, data: &HotelUpdate) -> ServiceResult<Option<Hotel>> {
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE hotels SET
            location_id = COALESCE($1, location_id),
            name = COALESCE($2, name),
            star_rating = COALESCE($3, star_rating),
            address = COALESCE($4, address),
            phone = COALESCE($5, phone),
            email = COALESCE($6, email),
            website = COALESCE($7, website),
            description = COALESCE($8, description),
            image_url = COALESCE($9, image_url),
            is_active = COALESCE($10, is_active),
            updated_at = $11
        WHERE id = $12
        RETURNING {HOTEL_COLUMNS}
        "#
    ))
    .bind(data.location_id)
    .bind(&data.name)
    .bind(data.star_rating)
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.website)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| location_fk(e, data.location_id.unwrap_or_default()))?;
    Ok(row)
}

pub async fn delete_hotel(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let rows = sqlx::query("DELETE FROM hotels WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Activities ──

const ACTIVITY_COLUMNS: &str = "id, location_id, title, description, duration, default_price, \
                                image_url, is_active, created_at, updated_at";

pub async fn list_activities(
    pool: &PgPool,
    location_id: Option<i64>,
) -> Result<Vec<Activity>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE ($1::BIGINT IS NULL OR location_id = $1) ORDER BY title"
    ))
    .bind(location_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_activity(pool: &PgPool, id: i64) -> Result<Option<Activity>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Activities by id, in no particular order
pub async fn activities_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<Activity>, BoxError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create_activity(pool: &PgPool, data: &ActivityCreate) -> ServiceResult<Activity> {
    if !data.default_price.is_finite() || data.default_price < 0.0 {
        return Err(AppError::validation("default_price must not be negative").into());
    }
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO activities (id, location_id, title, description, duration, default_price,
                                image_url, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8)
        RETURNING {ACTIVITY_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.location_id)
    .bind(data.title.trim())
    .bind(&data.description)
    .bind(&data.duration)
    .bind(data.default_price)
    .bind(&data.image_url)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| location_fk(e, data.location_id))?;
    Ok(row)
}

pub async fn update_activity(
    pool: &PgPool,
    id: i64,
    data: &ActivityUpdate,
) -> ServiceResult<Option<Activity>> {
    if data.default_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(AppError::validation("default_price must not be negative").into());
    }
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE activities SET
            location_id = COALESCE($1, location_id),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            duration = COALESCE($4, duration),
            default_price = COALESCE($5, default_price),
            image_url = COALESCE($6, image_url),
            is_active = COALESCE($7, is_active),
            updated_at = $8
        WHERE id = $9
        RETURNING {ACTIVITY_COLUMNS}
        "#
    ))
    .bind(data.location_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.duration)
    .bind(data.default_price)
    .bind(&data.image_url)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| location_fk(e, data.location_id.unwrap_or_default()))?;
    Ok(row)
}

pub async fn delete_activity(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let rows = sqlx::query("DELETE FROM activities WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// FK failure on `location_id` → LocationNotFound
pub(crate) fn location_fk(e: sqlx::Error, location_id: i64) -> crate::error::ServiceError {
    if is_foreign_key_violation(&e) {
        AppError::new(ErrorCode::LocationNotFound)
            .with_detail("location_id", location_id)
            .into()
    } else {
        e.into()
    }
}
