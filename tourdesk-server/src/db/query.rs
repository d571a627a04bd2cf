//! Tour package queries (customer quotations)

use chrono::{Datelike, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DayOwner, DayPlanInput, InquiryStatus, QueryStatus, TourPackageQuery, TourPackageQueryCreate,
    TourPackageQueryDetail, TourPackageQueryUpdate, query_number,
};
use shared::pricing::{QuotePricing, Travellers, price};
use shared::util::{now_millis, parse_date, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::BoxError;
use super::itinerary::{delete_days, load_days, replace_days};
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation};

const QUERY_COLUMNS: &str = "id, query_number, inquiry_id, tour_package_id, customer_id, associate_partner_id, \
     title, customer_name, phone, email, location_id, travel_date, adults, children_with_bed, \
     children_without_bed, infants, inclusions, exclusions, terms, pricing, breakdown, grand_total, \
     status, created_by, confirmed_at, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryFilter<'a> {
    pub associate_partner_id: Option<i64>,
    pub inquiry_id: Option<i64>,
    pub status: Option<&'a str>,
}

pub async fn list(pool: &PgPool, filter: QueryFilter<'_>) -> Result<Vec<TourPackageQuery>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {QUERY_COLUMNS} FROM tour_package_queries
        WHERE ($1::BIGINT IS NULL OR associate_partner_id = $1)
          AND ($2::BIGINT IS NULL OR inquiry_id = $2)
          AND ($3::TEXT IS NULL OR status = $3)
        ORDER BY created_at DESC
        "#
    ))
    .bind(filter.associate_partner_id)
    .bind(filter.inquiry_id)
    .bind(filter.status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<TourPackageQuery>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {QUERY_COLUMNS} FROM tour_package_queries WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_detail(pool: &PgPool, id: i64) -> Result<Option<TourPackageQueryDetail>, BoxError> {
    let Some(query) = get(pool, id).await? else {
        return Ok(None);
    };
    let days = load_days(pool, DayOwner::Query, id).await?;
    Ok(Some(TourPackageQueryDetail { query, days }))
}

/// Headcounts on the query are authoritative over those in the pricing input
fn travellers(adults: i32, with_bed: i32, without_bed: i32, infants: i32) -> Travellers {
    let count = |n: i32| u32::try_from(n).unwrap_or(0);
    Travellers {
        adults: count(adults),
        children_with_bed: count(with_bed),
        children_without_bed: count(without_bed),
        infants: count(infants),
    }
}

/// Priced pricing input, breakdown and grand total ready to store
struct Priced {
    pricing: serde_json::Value,
    breakdown: serde_json::Value,
    grand_total: f64,
}

fn price_quote(mut pricing: QuotePricing, travellers: Travellers) -> ServiceResult<Priced> {
    pricing.travellers = travellers;
    let breakdown = price(&pricing).map_err(AppError::from)?;
    let grand_total = breakdown.grand_total;
    let to_json = |v: serde_json::Result<serde_json::Value>| {
        v.map_err(|e| ServiceError::Db(Box::new(e)))
    };
    Ok(Priced {
        pricing: to_json(serde_json::to_value(&pricing))?,
        breakdown: to_json(serde_json::to_value(&breakdown))?,
        grand_total,
    })
}

fn check_headcount(values: &[(&str, Option<i32>)]) -> Result<(), AppError> {
    for (field, value) in values {
        if let Some(v) = value {
            let min = if *field == "adults" { 1 } else { 0 };
            if *v < min {
                return Err(AppError::with_message(
                    ErrorCode::ValueOutOfRange,
                    format!("{field} must be at least {min}"),
                )
                .with_detail("field", *field));
            }
        }
    }
    Ok(())
}

fn check_travel_date(date: Option<&str>) -> Result<(), AppError> {
    match date {
        Some(d) if parse_date(d).is_none() => Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "travel_date must be YYYY-MM-DD",
        )
        .with_detail("field", "travel_date")),
        _ => Ok(()),
    }
}

fn reference_error(e: sqlx::Error) -> ServiceError {
    if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::NotFound, "Referenced inquiry, customer or partner not found").into()
    } else {
        e.into()
    }
}

async fn next_query_number(conn: &mut PgConnection) -> Result<String, BoxError> {
    let seq: i64 = sqlx::query_scalar("SELECT nextval('query_number_seq')")
        .fetch_one(conn)
        .await?;
    Ok(query_number(Utc::now().year(), seq))
}

/// Create a quotation, optionally seeded from a tour package.
///
/// From a package, days, inclusions, exclusions, title and location are
/// copied unless the request supplies its own.
pub async fn create(
    pool: &PgPool,
    data: &TourPackageQueryCreate,
    created_by: Option<i64>,
) -> ServiceResult<TourPackageQueryDetail> {
    if data.customer_name.trim().is_empty() {
        return Err(AppError::required("customer_name").into());
    }
    check_headcount(&[
        ("adults", Some(data.adults)),
        ("children_with_bed", Some(data.children_with_bed)),
        ("children_without_bed", Some(data.children_without_bed)),
        ("infants", Some(data.infants)),
    ])?;
    check_travel_date(data.travel_date.as_deref())?;

    let package = match data.tour_package_id {
        Some(package_id) => {
            let detail = super::tour_package::get_detail(pool, package_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::TourPackageNotFound).with_detail("tour_package_id", package_id)
                })?;
            if detail.package.is_archived {
                return Err(AppError::new(ErrorCode::TourPackageArchived)
                    .with_detail("tour_package_id", package_id)
                    .into());
            }
            Some(detail)
        }
        None => None,
    };

    let days: Vec<DayPlanInput> = match (&data.days, &package) {
        (Some(days), _) => days.clone(),
        (None, Some(p)) => p.days.iter().map(DayPlanInput::from).collect(),
        (None, None) => Vec::new(),
    };
    let inclusions = data
        .inclusions
        .clone()
        .or_else(|| package.as_ref().map(|p| p.package.inclusions.clone()))
        .unwrap_or_default();
    let exclusions = data
        .exclusions
        .clone()
        .or_else(|| package.as_ref().map(|p| p.package.exclusions.clone()))
        .unwrap_or_default();
    let title = data
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| package.as_ref().map(|p| p.package.name.clone()))
        .unwrap_or_else(|| format!("Tour for {}", data.customer_name.trim()));
    let location_id = data
        .location_id
        .or_else(|| package.as_ref().map(|p| p.package.location_id));

    let priced = match &data.pricing {
        Some(pricing) => Some(price_quote(
            pricing.clone(),
            travellers(data.adults, data.children_with_bed, data.children_without_bed, data.infants),
        )?),
        None => None,
    };
    let status = if priced.is_some() {
        QueryStatus::Priced
    } else {
        QueryStatus::Draft
    };

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;
    let number = next_query_number(&mut tx).await?;
    sqlx::query(
        r#"
        INSERT INTO tour_package_queries (id, query_number, inquiry_id, tour_package_id, customer_id,
            associate_partner_id, title, customer_name, phone, email, location_id, travel_date, adults,
            children_with_bed, children_without_bed, infants, inclusions, exclusions, terms, pricing,
            breakdown, grand_total, status, created_by, confirmed_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19,
                $20, $21, $22, $23, $24, NULL, $25, $25)
        "#,
    )
    .bind(id)
    .bind(&number)
    .bind(data.inquiry_id)
    .bind(data.tour_package_id)
    .bind(data.customer_id)
    .bind(data.associate_partner_id)
    .bind(title.trim())
    .bind(data.customer_name.trim())
    .bind(&data.phone)
    .bind(&data.email)
    .bind(location_id)
    .bind(&data.travel_date)
    .bind(data.adults)
    .bind(data.children_with_bed)
    .bind(data.children_without_bed)
    .bind(data.infants)
    .bind(&inclusions)
    .bind(&exclusions)
    .bind(&data.terms)
    .bind(priced.as_ref().map(|p| &p.pricing))
    .bind(priced.as_ref().map(|p| &p.breakdown))
    .bind(priced.as_ref().map(|p| p.grand_total))
    .bind(status.as_str())
    .bind(created_by)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(reference_error)?;

    replace_days(&mut tx, DayOwner::Query, id, &days).await?;
    if priced.is_some()
        && let Some(inquiry_id) = data.inquiry_id
    {
        mark_inquiry(&mut tx, inquiry_id, InquiryStatus::Quoted).await?;
    }
    tx.commit().await?;

    tracing::info!(query_id = id, query_number = %number, "Tour package query created");
    get_detail(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::QueryNotFound).into())
}

/// Row guard for writes: a confirmed query is frozen even if it was
/// confirmed after `editable` read it
const NOT_CONFIRMED: &str = "status <> 'confirmed'";

/// A guarded write that matched no row lost the race to a confirm
fn still_editable<T>(row: Option<T>, id: i64) -> ServiceResult<T> {
    row.ok_or_else(|| {
        AppError::new(ErrorCode::QueryAlreadyConfirmed)
            .with_detail("id", id)
            .into()
    })
}

/// Load a query that may still change
async fn editable(pool: &PgPool, id: i64) -> ServiceResult<TourPackageQuery> {
    let query = get(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::QueryNotFound))?;
    if query.is_confirmed() {
        return Err(AppError::new(ErrorCode::QueryAlreadyConfirmed)
            .with_detail("query_number", query.query_number.as_str())
            .into());
    }
    Ok(query)
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &TourPackageQueryUpdate,
) -> ServiceResult<TourPackageQueryDetail> {
    let current = editable(pool, id).await?;
    check_headcount(&[
        ("adults", data.adults),
        ("children_with_bed", data.children_with_bed),
        ("children_without_bed", data.children_without_bed),
        ("infants", data.infants),
    ])?;
    check_travel_date(data.travel_date.as_deref())?;

    // Headcount changes invalidate a stored price; re-price with the new counts
    let counts = travellers(
        data.adults.unwrap_or(current.adults),
        data.children_with_bed.unwrap_or(current.children_with_bed),
        data.children_without_bed.unwrap_or(current.children_without_bed),
        data.infants.unwrap_or(current.infants),
    );
    let pricing = data.pricing.clone().or_else(|| current.pricing_input());
    let priced = match pricing {
        Some(p) => Some(price_quote(p, counts)?),
        None => None,
    };
    let status = if priced.is_some() {
        QueryStatus::Priced
    } else {
        QueryStatus::Draft
    };

    let mut tx = pool.begin().await?;
    let updated = sqlx::query(&format!(
        r#"
        UPDATE tour_package_queries SET
            title = COALESCE($1, title),
            customer_id = COALESCE($2, customer_id),
            customer_name = COALESCE($3, customer_name),
            phone = COALESCE($4, phone),
            email = COALESCE($5, email),
            location_id = COALESCE($6, location_id),
            travel_date = COALESCE($7, travel_date),
            adults = COALESCE($8, adults),
            children_with_bed = COALESCE($9, children_with_bed),
            children_without_bed = COALESCE($10, children_without_bed),
            infants = COALESCE($11, infants),
            inclusions = COALESCE($12, inclusions),
            exclusions = COALESCE($13, exclusions),
            terms = COALESCE($14, terms),
            pricing = $15,
            breakdown = $16,
            grand_total = $17,
            status = $18,
            updated_at = $19
        WHERE id = $20 AND {NOT_CONFIRMED}
        "#
    ))
    .bind(&data.title)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.location_id)
    .bind(&data.travel_date)
    .bind(data.adults)
    .bind(data.children_with_bed)
    .bind(data.children_without_bed)
    .bind(data.infants)
    .bind(&data.inclusions)
    .bind(&data.exclusions)
    .bind(&data.terms)
    .bind(priced.as_ref().map(|p| &p.pricing))
    .bind(priced.as_ref().map(|p| &p.breakdown))
    .bind(priced.as_ref().map(|p| p.grand_total))
    .bind(status.as_str())
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(reference_error)?;
    still_editable((updated.rows_affected() > 0).then_some(()), id)?;

    if let Some(days) = &data.days {
        replace_days(&mut tx, DayOwner::Query, id, days).await?;
    }
    tx.commit().await?;

    get_detail(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::QueryNotFound).into())
}

/// Recompute and store the price breakdown.
///
/// Uses `pricing` when given, otherwise the stored pricing input.
pub async fn reprice(
    pool: &PgPool,
    id: i64,
    pricing: Option<QuotePricing>,
) -> ServiceResult<TourPackageQuery> {
    let current = editable(pool, id).await?;
    let input = pricing
        .or_else(|| current.pricing_input())
        .ok_or_else(|| AppError::required("pricing"))?;
    let priced = price_quote(
        input,
        travellers(
            current.adults,
            current.children_with_bed,
            current.children_without_bed,
            current.infants,
        ),
    )?;

    let mut tx = pool.begin().await?;
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE tour_package_queries SET
            pricing = $1, breakdown = $2, grand_total = $3, status = $4, updated_at = $5
        WHERE id = $6 AND {NOT_CONFIRMED}
        RETURNING {QUERY_COLUMNS}
        "#
    ))
    .bind(&priced.pricing)
    .bind(&priced.breakdown)
    .bind(priced.grand_total)
    .bind(QueryStatus::Priced.as_str())
    .bind(now_millis())
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let row: TourPackageQuery = still_editable(row, id)?;
    if let Some(inquiry_id) = row.inquiry_id {
        mark_inquiry(&mut tx, inquiry_id, InquiryStatus::Quoted).await?;
    }
    tx.commit().await?;

    tracing::info!(query_id = id, grand_total = priced.grand_total, "Tour package query priced");
    Ok(row)
}

/// Confirm a priced query; a linked open inquiry becomes confirmed too
pub async fn confirm(pool: &PgPool, id: i64) -> ServiceResult<TourPackageQuery> {
    let current = editable(pool, id).await?;
    if current.status != QueryStatus::Priced.as_str() {
        return Err(AppError::new(ErrorCode::QueryNotPriced)
            .with_detail("query_number", current.query_number.as_str())
            .into());
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;
    // Only the priced row flips; a second confirm matches nothing
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE tour_package_queries SET status = $1, confirmed_at = $2, updated_at = $2
        WHERE id = $3 AND status = $4
        RETURNING {QUERY_COLUMNS}
        "#
    ))
    .bind(QueryStatus::Confirmed.as_str())
    .bind(now)
    .bind(id)
    .bind(QueryStatus::Priced.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    let row: TourPackageQuery = still_editable(row, id)?;
    if let Some(inquiry_id) = row.inquiry_id {
        mark_inquiry(&mut tx, inquiry_id, InquiryStatus::Confirmed).await?;
    }
    tx.commit().await?;

    tracing::info!(query_id = id, query_number = %row.query_number, "Tour package query confirmed");
    Ok(row)
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let Some(query) = get(pool, id).await? else {
        return Ok(false);
    };
    if query.is_confirmed() {
        return Err(AppError::new(ErrorCode::QueryAlreadyConfirmed)
            .with_detail("query_number", query.query_number.as_str())
            .into());
    }
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM tour_package_queries WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    delete_days(&mut tx, DayOwner::Query, id).await?;
    tx.commit().await?;
    Ok(true)
}

/// Advance an open inquiry; closed ones and no-op moves are left alone
async fn mark_inquiry(
    conn: &mut PgConnection,
    inquiry_id: i64,
    status: InquiryStatus,
) -> Result<(), BoxError> {
    sqlx::query(
        r#"
        UPDATE inquiries SET status = $1, updated_at = $2
        WHERE id = $3 AND status NOT IN ('confirmed', 'cancelled', 'lost') AND status <> $1
        "#,
    )
    .bind(status.as_str())
    .bind(now_millis())
    .bind(inquiry_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travellers_clamps_negative_counts() {
        let t = travellers(2, 1, -1, 0);
        assert_eq!(t.adults, 2);
        assert_eq!(t.children_with_bed, 1);
        assert_eq!(t.children_without_bed, 0);
    }

    #[test]
    fn test_lost_race_reports_already_confirmed() {
        assert_eq!(still_editable(Some(3), 42).ok(), Some(3));
        match still_editable(None::<()>, 42) {
            Err(ServiceError::App(e)) => assert_eq!(e.code, ErrorCode::QueryAlreadyConfirmed),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(NOT_CONFIRMED, format!("status <> '{}'", QueryStatus::Confirmed.as_str()));
    }

    #[test]
    fn test_check_headcount() {
        assert!(check_headcount(&[("adults", Some(1)), ("infants", Some(0))]).is_ok());
        assert!(check_headcount(&[("adults", None)]).is_ok());
        let err = check_headcount(&[("adults", Some(0))]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(check_headcount(&[("infants", Some(-1))]).is_err());
    }

    #[test]
    fn test_price_quote_uses_query_headcount() {
        let pricing = QuotePricing {
            travellers: Travellers {
                adults: 9,
                ..Default::default()
            },
            per_person: shared::pricing::PerPersonRates {
                adult: 1_000.0,
                ..Default::default()
            },
            gst_percent: Some(0.0),
            ..Default::default()
        };
        let priced = price_quote(pricing, travellers(2, 0, 0, 0)).unwrap();
        assert_eq!(priced.grand_total, 2_000.0);
        assert_eq!(priced.pricing["travellers"]["adults"], 2);
        assert_eq!(priced.breakdown["per_adult"], 1_000.0);
    }
}
