//! Tour packages and their public website view

use shared::error::{AppError, ErrorCode};
use shared::models::{
    DayOwner, DayPlanInput, PublicTourPackage, TourPackage, TourPackageCreate, TourPackageDetail,
    TourPackageUpdate, nights_for,
};
use shared::util::{now_millis, slugify, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;
use super::itinerary::{delete_days, load_days, replace_days};
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation, is_unique_violation};

const PACKAGE_COLUMNS: &str = "id, name, slug, location_id, itinerary_id, duration_days, duration_nights, \
     price_from, summary, description, image_url, inclusions, exclusions, is_published, is_archived, \
     created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct PackageFilter {
    pub location_id: Option<i64>,
    pub include_archived: bool,
}

pub async fn list(pool: &PgPool, filter: PackageFilter) -> Result<Vec<TourPackage>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {PACKAGE_COLUMNS} FROM tour_packages
        WHERE ($1::BIGINT IS NULL OR location_id = $1)
          AND ($2 OR NOT is_archived)
        ORDER BY updated_at DESC
        "#
    ))
    .bind(filter.location_id)
    .bind(filter.include_archived)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<TourPackage>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {PACKAGE_COLUMNS} FROM tour_packages WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_detail(pool: &PgPool, id: i64) -> Result<Option<TourPackageDetail>, BoxError> {
    let Some(package) = get(pool, id).await? else {
        return Ok(None);
    };
    let days = load_days(pool, DayOwner::TourPackage, id).await?;
    Ok(Some(TourPackageDetail { package, days }))
}

/// Create a package. With no days of its own, the linked itinerary's days are copied.
pub async fn create(pool: &PgPool, data: &TourPackageCreate) -> ServiceResult<TourPackageDetail> {
    if data.name.trim().is_empty() {
        return Err(AppError::required("name").into());
    }
    if !data.price_from.is_finite() || data.price_from < 0.0 {
        return Err(AppError::validation("price_from must not be negative").into());
    }
    let slug = slugify(data.slug.as_deref().unwrap_or(&data.name));
    if slug.is_empty() {
        return Err(AppError::validation("Package name must contain letters or digits").into());
    }

    let mut days = data.days.clone();
    if days.is_empty()
        && let Some(itinerary_id) = data.itinerary_id
    {
        let source = load_days(pool, DayOwner::Itinerary, itinerary_id).await?;
        days = source.iter().map(DayPlanInput::from).collect();
    }

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO tour_packages (id, name, slug, location_id, itinerary_id, duration_days, duration_nights,
                                   price_from, summary, description, image_url, inclusions, exclusions,
                                   is_published, is_archived, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, FALSE, $15, $15)
        "#,
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&slug)
    .bind(data.location_id)
    .bind(data.itinerary_id)
    .bind(days.len() as i32)
    .bind(nights_for(days.len()))
    .bind(data.price_from)
    .bind(&data.summary)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.inclusions)
    .bind(&data.exclusions)
    .bind(data.is_published)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| package_write_error(e, &slug))?;

    replace_days(&mut tx, DayOwner::TourPackage, id, &days).await?;
    tx.commit().await?;

    get_detail(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TourPackageNotFound).into())
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &TourPackageUpdate,
) -> ServiceResult<Option<TourPackageDetail>> {
    if data.price_from.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(AppError::validation("price_from must not be negative").into());
    }
    let slug = data.slug.as_deref().map(slugify);
    if slug.as_deref() == Some("") {
        return Err(AppError::validation("slug must contain letters or digits").into());
    }
    let (days, nights) = match &data.days {
        Some(d) => (Some(d.len() as i32), Some(nights_for(d.len()))),
        None => (None, None),
    };

    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE tour_packages SET
            name = COALESCE($1, name),
            slug = COALESCE($2, slug),
            location_id = COALESCE($3, location_id),
            price_from = COALESCE($4, price_from),
            summary = COALESCE($5, summary),
            description = COALESCE($6, description),
            image_url = COALESCE($7, image_url),
            inclusions = COALESCE($8, inclusions),
            exclusions = COALESCE($9, exclusions),
            duration_days = COALESCE($10, duration_days),
            duration_nights = COALESCE($11, duration_nights),
            is_published = COALESCE($12, is_published),
            is_archived = COALESCE($13, is_archived),
            updated_at = $14
        WHERE id = $15
        "#,
    )
    .bind(&data.name)
    .bind(&slug)
    .bind(data.location_id)
    .bind(data.price_from)
    .bind(&data.summary)
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(&data.inclusions)
    .bind(&data.exclusions)
    .bind(days)
    .bind(nights)
    .bind(data.is_published)
    .bind(data.is_archived)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| package_write_error(e, slug.as_deref().unwrap_or_default()))?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(days) = &data.days {
        replace_days(&mut tx, DayOwner::TourPackage, id, days).await?;
    }
    tx.commit().await?;
    Ok(get_detail(pool, id).await?)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let mut tx = pool.begin().await?;
    let rows = sqlx::query("DELETE FROM tour_packages WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    delete_days(&mut tx, DayOwner::TourPackage, id).await?;
    tx.commit().await?;
    Ok(true)
}

/// Copy a package with its days as an unpublished draft named "<name> (Copy)"
pub async fn duplicate(pool: &PgPool, id: i64) -> ServiceResult<Option<TourPackageDetail>> {
    let Some(source) = get_detail(pool, id).await? else {
        return Ok(None);
    };

    let mut tx = pool.begin().await?;
    let slug = free_copy_slug(&mut tx, &source.package.slug).await?;
    let new_id = snowflake_id();
    let now = now_millis();
    let p = &source.package;
    sqlx::query(
        r#"
        INSERT INTO tour_packages (id, name, slug, location_id, itinerary_id, duration_days, duration_nights,
                                   price_from, summary, description, image_url, inclusions, exclusions,
                                   is_published, is_archived, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE, FALSE, $14, $14)
        "#,
    )
    .bind(new_id)
    .bind(format!("{} (Copy)", p.name))
    .bind(&slug)
    .bind(p.location_id)
    .bind(p.itinerary_id)
    .bind(p.duration_days)
    .bind(p.duration_nights)
    .bind(p.price_from)
    .bind(&p.summary)
    .bind(&p.description)
    .bind(&p.image_url)
    .bind(&p.inclusions)
    .bind(&p.exclusions)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| package_write_error(e, &slug))?;

    let days: Vec<DayPlanInput> = source.days.iter().map(DayPlanInput::from).collect();
    replace_days(&mut tx, DayOwner::TourPackage, new_id, &days).await?;
    tx.commit().await?;

    tracing::info!(source_id = id, package_id = new_id, slug = %slug, "Tour package duplicated");
    Ok(get_detail(pool, new_id).await?)
}

/// First of `<slug>-copy`, `<slug>-copy-2`, ... not taken yet
async fn free_copy_slug(conn: &mut PgConnection, slug: &str) -> Result<String, BoxError> {
    let base = format!("{slug}-copy");
    let mut candidate = base.clone();
    for n in 2.. {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tour_packages WHERE slug = $1)")
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await?;
        if !taken {
            break;
        }
        candidate = format!("{base}-{n}");
    }
    Ok(candidate)
}

fn package_write_error(e: sqlx::Error, slug: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::new(ErrorCode::TourPackageSlugExists)
            .with_detail("slug", slug)
            .into()
    } else if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::LocationNotFound, "Location or itinerary not found").into()
    } else {
        e.into()
    }
}

// ── Public website ──

pub async fn list_public(
    pool: &PgPool,
    location_slug: Option<&str>,
) -> Result<Vec<PublicTourPackage>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT p.name, p.slug, l.name AS location_name, p.duration_days, p.duration_nights,
               p.price_from, p.summary, p.image_url
        FROM tour_packages p
        JOIN locations l ON l.id = p.location_id
        WHERE p.is_published AND NOT p.is_archived AND l.is_active
          AND ($1::TEXT IS NULL OR l.slug = $1)
        ORDER BY p.price_from, p.name
        "#,
    )
    .bind(location_slug)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_public(pool: &PgPool, slug: &str) -> Result<Option<TourPackageDetail>, BoxError> {
    let package: Option<TourPackage> = sqlx::query_as(&format!(
        "SELECT {PACKAGE_COLUMNS} FROM tour_packages WHERE slug = $1 AND is_published AND NOT is_archived"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    let Some(package) = package else {
        return Ok(None);
    };
    let days = load_days(pool, DayOwner::TourPackage, package.id).await?;
    Ok(Some(TourPackageDetail { package, days }))
}
