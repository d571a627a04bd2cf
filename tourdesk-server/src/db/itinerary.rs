//! Itineraries and the shared day-plan table

use shared::error::{AppError, ErrorCode};
use shared::models::{
    DayOwner, DayPlan, DayPlanInput, Itinerary, ItineraryCreate, ItineraryDetail, ItineraryUpdate,
    nights_for, validate_days,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::BoxError;
use super::catalog::location_fk;
use crate::error::{ServiceResult, is_foreign_key_violation};

// ── Day plans ──

pub async fn load_days(
    executor: impl PgExecutor<'_>,
    owner: DayOwner,
    owner_id: i64,
) -> Result<Vec<DayPlan>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, day_number, title, description, hotel_id, meals, activity_ids
        FROM day_plans
        WHERE owner_kind = $1 AND owner_id = $2
        ORDER BY day_number
        "#,
    )
    .bind(owner.as_str())
    .bind(owner_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Replace the whole day list of an owner
pub async fn replace_days(
    conn: &mut PgConnection,
    owner: DayOwner,
    owner_id: i64,
    days: &[DayPlanInput],
) -> ServiceResult<()> {
    validate_days(days)
        .map_err(|msg| AppError::with_message(ErrorCode::ItineraryDaysInvalid, msg))?;

    sqlx::query("DELETE FROM day_plans WHERE owner_kind = $1 AND owner_id = $2")
        .bind(owner.as_str())
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    for day in days {
        sqlx::query(
            r#"
            INSERT INTO day_plans (id, owner_kind, owner_id, day_number, title, description, hotel_id, meals, activity_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(snowflake_id())
        .bind(owner.as_str())
        .bind(owner_id)
        .bind(day.day_number)
        .bind(day.title.trim())
        .bind(&day.description)
        .bind(day.hotel_id)
        .bind(&day.meals)
        .bind(&day.activity_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::new(ErrorCode::HotelNotFound)
                    .with_detail("day_number", day.day_number)
                    .into()
            } else {
                crate::error::ServiceError::from(e)
            }
        })?;
    }
    Ok(())
}

pub async fn delete_days(
    conn: &mut PgConnection,
    owner: DayOwner,
    owner_id: i64,
) -> Result<(), BoxError> {
    sqlx::query("DELETE FROM day_plans WHERE owner_kind = $1 AND owner_id = $2")
        .bind(owner.as_str())
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ── Itineraries ──

const ITINERARY_COLUMNS: &str = "id, location_id, title, description, nights, created_at, updated_at";

pub async fn list(pool: &PgPool, location_id: Option<i64>) -> Result<Vec<Itinerary>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ITINERARY_COLUMNS} FROM itineraries WHERE ($1::BIGINT IS NULL OR location_id = $1) ORDER BY title"
    ))
    .bind(location_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_detail(pool: &PgPool, id: i64) -> Result<Option<ItineraryDetail>, BoxError> {
    let itinerary: Option<Itinerary> =
        sqlx::query_as(&format!("SELECT {ITINERARY_COLUMNS} FROM itineraries WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some(itinerary) = itinerary else {
        return Ok(None);
    };
    let days = load_days(pool, DayOwner::Itinerary, id).await?;
    Ok(Some(ItineraryDetail { itinerary, days }))
}

pub async fn create(pool: &PgPool, data: &ItineraryCreate) -> ServiceResult<ItineraryDetail> {
    if data.title.trim().is_empty() {
        return Err(AppError::required("title").into());
    }
    let id = snowflake_id();
    let now = now_millis();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO itineraries (id, location_id, title, description, nights, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        "#,
    )
    .bind(id)
    .bind(data.location_id)
    .bind(data.title.trim())
    .bind(&data.description)
    .bind(nights_for(data.days.len()))
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| location_fk(e, data.location_id))?;

    replace_days(&mut tx, DayOwner::Itinerary, id, &data.days).await?;
    tx.commit().await?;

    get_detail(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItineraryNotFound).into())
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &ItineraryUpdate,
) -> ServiceResult<Option<ItineraryDetail>> {
    let mut tx = pool.begin().await?;
    let nights = data.days.as_ref().map(|d| nights_for(d.len()));
    let updated = sqlx::query(
        r#"
        UPDATE itineraries SET
            location_id = COALESCE($1, location_id),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            nights = COALESCE($4, nights),
            updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(data.location_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(nights)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| location_fk(e, data.location_id.unwrap_or_default()))?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(days) = &data.days {
        replace_days(&mut tx, DayOwner::Itinerary, id, days).await?;
    }
    tx.commit().await?;
    Ok(get_detail(pool, id).await?)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let mut tx = pool.begin().await?;
    let rows = sqlx::query("DELETE FROM itineraries WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    delete_days(&mut tx, DayOwner::Itinerary, id).await?;
    tx.commit().await?;
    Ok(true)
}
