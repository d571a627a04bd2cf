//! Customer inquiries and their assignment to operational staff

use shared::error::{AppError, ErrorCode};
use shared::models::{Inquiry, InquiryCreate, InquiryStatus, InquiryUpdate, OperationalStaff};
use shared::util::{now_millis, parse_date, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation};

const INQUIRY_COLUMNS: &str = "id, customer_name, phone, email, location_id, travel_date, adults, children, \
     budget, source, status, notes, associate_partner_id, assigned_staff_id, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct InquiryFilter<'a> {
    pub status: Option<&'a str>,
    pub assigned_staff_id: Option<i64>,
    pub associate_partner_id: Option<i64>,
}

pub async fn list(pool: &PgPool, filter: InquiryFilter<'_>) -> Result<Vec<Inquiry>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {INQUIRY_COLUMNS} FROM inquiries
        WHERE ($1::TEXT IS NULL OR status = $1)
          AND ($2::BIGINT IS NULL OR assigned_staff_id = $2)
          AND ($3::BIGINT IS NULL OR associate_partner_id = $3)
        ORDER BY created_at DESC
        "#
    ))
    .bind(filter.status)
    .bind(filter.assigned_staff_id)
    .bind(filter.associate_partner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Inquiry>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

fn check_fields(
    travel_date: Option<&str>,
    adults: Option<i32>,
    children: Option<i32>,
    budget: Option<f64>,
) -> Result<(), AppError> {
    if let Some(date) = travel_date
        && parse_date(date).is_none()
    {
        return Err(AppError::with_message(ErrorCode::InvalidFormat, "travel_date must be YYYY-MM-DD")
            .with_detail("field", "travel_date"));
    }
    if adults.is_some_and(|a| a < 1) {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "At least one adult is required"));
    }
    if children.is_some_and(|c| c < 0) {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "children must not be negative"));
    }
    if budget.is_some_and(|b| !b.is_finite() || b < 0.0) {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "budget must not be negative"));
    }
    Ok(())
}

fn reference_error(e: sqlx::Error) -> ServiceError {
    if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::NotFound, "Referenced location or partner not found").into()
    } else {
        e.into()
    }
}

pub async fn create(pool: &PgPool, data: &InquiryCreate) -> ServiceResult<Inquiry> {
    if data.customer_name.trim().is_empty() {
        return Err(AppError::required("customer_name").into());
    }
    if data.phone.trim().is_empty() {
        return Err(AppError::required("phone").into());
    }
    check_fields(
        data.travel_date.as_deref(),
        Some(data.adults),
        Some(data.children),
        data.budget,
    )?;

    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO inquiries (id, customer_name, phone, email, location_id, travel_date, adults, children,
                               budget, source, status, notes, associate_partner_id, assigned_staff_id,
                               created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'new', $11, $12, NULL, $13, $13)
        RETURNING {INQUIRY_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.customer_name.trim())
    .bind(data.phone.trim())
    .bind(&data.email)
    .bind(data.location_id)
    .bind(&data.travel_date)
    .bind(data.adults)
    .bind(data.children)
    .bind(data.budget)
    .bind(&data.source)
    .bind(&data.notes)
    .bind(data.associate_partner_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(reference_error)?;
    Ok(row)
}

/// Load an inquiry that may still change
async fn open_inquiry(pool: &PgPool, id: i64) -> ServiceResult<Inquiry> {
    let inquiry = get(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InquiryNotFound))?;
    if inquiry.status().is_none_or(|s| s.is_closed()) {
        return Err(AppError::new(ErrorCode::InquiryClosed)
            .with_detail("status", inquiry.status.as_str())
            .into());
    }
    Ok(inquiry)
}

pub async fn update(pool: &PgPool, id: i64, data: &InquiryUpdate) -> ServiceResult<Inquiry> {
    open_inquiry(pool, id).await?;
    check_fields(data.travel_date.as_deref(), data.adults, data.children, data.budget)?;

    let row = sqlx::query_as(&format!(
        r#"
        UPDATE inquiries SET
            customer_name = COALESCE($1, customer_name),
            phone = COALESCE($2, phone),
            email = COALESCE($3, email),
            location_id = COALESCE($4, location_id),
            travel_date = COALESCE($5, travel_date),
            adults = COALESCE($6, adults),
            children = COALESCE($7, children),
            budget = COALESCE($8, budget),
            source = COALESCE($9, source),
            notes = COALESCE($10, notes),
            updated_at = $11
        WHERE id = $12
        RETURNING {INQUIRY_COLUMNS}
        "#
    ))
    .bind(&data.customer_name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.location_id)
    .bind(&data.travel_date)
    .bind(data.adults)
    .bind(data.children)
    .bind(data.budget)
    .bind(&data.source)
    .bind(&data.notes)
    .bind(now_millis())
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(reference_error)?;
    Ok(row)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let rows = sqlx::query("DELETE FROM inquiries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Assign an open inquiry to an active staff member
pub async fn assign(
    pool: &PgPool,
    id: i64,
    staff_id: i64,
) -> ServiceResult<(Inquiry, OperationalStaff)> {
    open_inquiry(pool, id).await?;
    let staff = super::parties::get_staff(pool, staff_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::StaffNotFound).with_detail("staff_id", staff_id))?;

    let row = sqlx::query_as(&format!(
        r#"
        UPDATE inquiries SET
            assigned_staff_id = $1,
            status = CASE WHEN status = 'new' THEN 'contacted' ELSE status END,
            updated_at = $2
        WHERE id = $3
        RETURNING {INQUIRY_COLUMNS}
        "#
    ))
    .bind(staff_id)
    .bind(now_millis())
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok((row, staff))
}

/// Move an inquiry along its lifecycle; closed inquiries are frozen
pub async fn set_status(
    pool: &PgPool,
    id: i64,
    next: InquiryStatus,
    note: Option<&str>,
) -> ServiceResult<Inquiry> {
    let inquiry = get(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InquiryNotFound))?;
    let current = inquiry.status().unwrap_or(InquiryStatus::New);
    if current.is_closed() {
        return Err(AppError::new(ErrorCode::InquiryClosed)
            .with_detail("status", current.as_str())
            .into());
    }
    if !current.can_transition_to(next) {
        return Err(AppError::new(ErrorCode::InquiryStatusInvalid)
            .with_detail("from", current.as_str())
            .with_detail("to", next.as_str())
            .into());
    }

    let row = sqlx::query_as(&format!(
        r#"
        UPDATE inquiries SET
            status = $1,
            notes = CASE WHEN $2::TEXT IS NULL THEN notes
                         WHEN notes IS NULL THEN $2
                         ELSE notes || E'\n' || $2 END,
            updated_at = $3
        WHERE id = $4
        RETURNING {INQUIRY_COLUMNS}
        "#
    ))
    .bind(next.as_str())
    .bind(note)
    .bind(now_millis())
    .bind(id)
    .fetch_one(pool)
    .await?;
    tracing::info!(inquiry_id = id, from = %current, to = %next, "Inquiry status changed");
    Ok(row)
}
