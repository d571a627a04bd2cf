//! Tour package queries (quotations)
//!
//! Associate partners see and create only their own queries; everything
//! else on this resource is staff-only.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{TourPackageQuery, TourPackageQueryCreate, TourPackageQueryDetail, TourPackageQueryUpdate};
use shared::pricing::QuotePricing;
use shared::roles::Permission;

use super::{ApiResult, deleted, found, internal};
use crate::auth::Actor;
use crate::db::query::{self, QueryFilter};
use crate::error::pdf_error;
use crate::quote;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tour-package-queries", get(list).post(create))
        .route(
            "/api/tour-package-queries/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/api/tour-package-queries/{id}/price", post(price))
        .route("/api/tour-package-queries/{id}/confirm", post(confirm))
        .route("/api/tour-package-queries/{id}/pdf", get(pdf))
        .route("/api/tour-package-queries/{id}/html", get(html))
}

/// Staff with `Read`, or the partner that owns the query
fn can_view(actor: &Actor, query: &TourPackageQuery) -> Result<(), AppError> {
    match actor.partner_id() {
        Some(partner_id) if query.associate_partner_id == Some(partner_id) => Ok(()),
        Some(partner_id) => Err(AppError::new(ErrorCode::PartnerScopeViolation)
            .with_detail("partner_id", partner_id)),
        None => actor.require(Permission::Read),
    }
}

async fn visible_detail(state: &AppState, actor: &Actor, id: i64) -> Result<TourPackageQueryDetail, AppError> {
    let detail = query::get_detail(&state.pool, id).await.map_err(internal)?;
    let detail = found(detail, ErrorCode::QueryNotFound, id)?;
    can_view(actor, &detail.query)?;
    Ok(detail)
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryListParams {
    pub associate_partner_id: Option<i64>,
    pub inquiry_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<QueryListParams>,
) -> ApiResult<Vec<TourPackageQuery>> {
    let associate_partner_id = match actor.partner_id() {
        Some(own) => Some(own),
        None => {
            actor.require(Permission::Read)?;
            q.associate_partner_id
        }
    };
    let filter = QueryFilter {
        associate_partner_id,
        inquiry_id: q.inquiry_id,
        status: q.status.as_deref(),
    };
    let rows = query::list(&state.pool, filter).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<TourPackageQueryDetail> {
    Ok(Json(visible_detail(&state, &actor, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut data): Json<TourPackageQueryCreate>,
) -> Result<(StatusCode, Json<TourPackageQueryDetail>), AppError> {
    match actor.partner_id() {
        // Partners always file under themselves
        Some(partner_id) => data.associate_partner_id = Some(partner_id),
        None => actor.require(Permission::QueriesWrite)?,
    }
    let detail = query::create(&state.pool, &data, actor.staff_id()).await?;
    tracing::info!(
        query_id = detail.query.id,
        query_number = %detail.query.query_number,
        partner_id = ?detail.query.associate_partner_id,
        "Tour package query created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(data): Json<TourPackageQueryUpdate>,
) -> ApiResult<TourPackageQueryDetail> {
    actor.require(Permission::QueriesWrite)?;
    Ok(Json(query::update(&state.pool, id, &data).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    actor.require(Permission::QueriesWrite)?;
    let removed = query::delete(&state.pool, id).await?;
    deleted(removed, ErrorCode::QueryNotFound, id)
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceRequest {
    /// Replaces the stored pricing input; absent re-prices the stored one
    pub pricing: Option<QuotePricing>,
}

/// POST /api/tour-package-queries/{id}/price
pub async fn price(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(req): Json<PriceRequest>,
) -> ApiResult<TourPackageQuery> {
    actor.require(Permission::QueriesWrite)?;
    let priced = query::reprice(&state.pool, id, req.pricing).await?;
    tracing::info!(query_id = id, grand_total = ?priced.grand_total, "Query priced");
    Ok(Json(priced))
}

/// POST /api/tour-package-queries/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<TourPackageQuery> {
    actor.require(Permission::QueriesWrite)?;
    let confirmed = query::confirm(&state.pool, id).await?;
    tracing::info!(query_id = id, query_number = %confirmed.query_number, "Query confirmed");
    Ok(Json(confirmed))
}

async fn quote_html(state: &AppState, actor: &Actor, id: i64) -> Result<(String, String), AppError> {
    let detail = visible_detail(state, actor, id).await?;
    let html = quote::render_html(&state.pool, &state.company, &detail)
        .await
        .map_err(internal)?;
    Ok((detail.query.query_number, html))
}

/// GET /api/tour-package-queries/{id}/html - the document the PDF is printed from
pub async fn html(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let (_, html) = quote_html(&state, &actor, id).await?;
    Ok(Html(html))
}

fn etag_matches(headers: &HeaderMap, key: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim().trim_matches('"') == key))
}

/// GET /api/tour-package-queries/{id}/pdf
///
/// The ETag is the content hash of the HTML, so an unchanged quotation
/// answers 304 without touching the renderer.
pub async fn pdf(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (query_number, html) = quote_html(&state, &actor, id).await?;
    let etag = format!("\"{}\"", tour_pdf::content_key(&html));
    if etag_matches(&headers, etag.trim_matches('"')) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let rendered = state
        .pdf
        .render(&actor.client_key(), &html)
        .await
        .map_err(pdf_error)?;
    tracing::info!(query_id = id, cached = rendered.cached, bytes = rendered.bytes.len(), "Quotation PDF served");

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{query_number}.pdf\""))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::ETAG,
                HeaderValue::from_str(&format!("\"{}\"", rendered.key))
                    .unwrap_or_else(|_| HeaderValue::from_static("\"\"")),
            ),
        ],
        Body::from(rendered.bytes.as_ref().clone()),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::roles::Role;

    fn query(partner: Option<i64>) -> TourPackageQuery {
        serde_json::from_value(serde_json::json!({
            "id": 1, "query_number": "TPQ-2025-000001", "inquiry_id": null, "tour_package_id": null,
            "customer_id": null, "associate_partner_id": partner, "title": "Goa 3N", "customer_name": "Ravi",
            "phone": null, "email": null, "location_id": null, "travel_date": null, "adults": 2,
            "children_with_bed": 0, "children_without_bed": 0, "infants": 0, "inclusions": [],
            "exclusions": [], "terms": null, "pricing": null, "breakdown": null, "grand_total": null,
            "status": "draft", "created_by": null, "confirmed_at": null, "created_at": 0, "updated_at": 0
        }))
        .unwrap()
    }

    #[test]
    fn test_partner_sees_only_own_queries() {
        let partner = Actor::Partner { id: 7 };
        assert!(can_view(&partner, &query(Some(7))).is_ok());
        assert_eq!(
            can_view(&partner, &query(Some(8))).unwrap_err().code,
            ErrorCode::PartnerScopeViolation
        );
        assert!(can_view(&partner, &query(None)).is_err());

        let viewer = Actor::Staff { id: 1, role: Role::Viewer };
        assert!(can_view(&viewer, &query(Some(8))).is_ok());
    }

    #[test]
    fn test_etag_matches() {
        let mut headers = HeaderMap::new();
        assert!(!etag_matches(&headers, "abc"));
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"xyz\", \"abc\""));
        assert!(etag_matches(&headers, "abc"));
        assert!(!etag_matches(&headers, "ab"));
    }
}
