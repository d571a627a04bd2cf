//! Purchases, sales and their returns
//!
//! Header totals are always derived from the line items; the GST split
//! follows the place of supply against the company's state code.

use shared::error::{AppError, ErrorCode};
use shared::invoice::{DocumentTotals, LineItem, check_return, document_totals, supply_kind};
use shared::models::{
    DocumentItem, DocumentKind, PurchaseCreate, PurchaseDetail, PurchaseReturn, PurchaseUpdate,
    PurchaseWithItems, ReturnCreate, ReturnWithItems, SaleCreate, SaleDetail, SaleReturn,
    SaleUpdate, SaleWithItems, invoice_number,
};
use shared::tds::financial_year;
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::{BoxError, require_date};
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation, is_unique_violation};

/// Date range and party filter shared by document listings
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentFilter<'a> {
    pub party_id: Option<i64>,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

// ── Line items ──

pub async fn load_items(
    executor: impl PgExecutor<'_>,
    kind: DocumentKind,
    doc_id: i64,
) -> Result<Vec<DocumentItem>, BoxError> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, description, quantity, rate, tax_percent, taxable, tax, total
        FROM document_items
        WHERE doc_kind = $1 AND doc_id = $2
        ORDER BY position
        "#,
    )
    .bind(kind.as_str())
    .bind(doc_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

async fn replace_items(
    conn: &mut PgConnection,
    kind: DocumentKind,
    doc_id: i64,
    items: &[LineItem],
    totals: &DocumentTotals,
) -> Result<(), BoxError> {
    delete_items(conn, kind, doc_id).await?;
    for (position, (item, line)) in items.iter().zip(&totals.lines).enumerate() {
        let row = DocumentItem::from_line(snowflake_id(), item, line);
        sqlx::query(
            r#"
            INSERT INTO document_items (id, doc_kind, doc_id, position, description, quantity, rate,
                                        tax_percent, taxable, tax, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(kind.as_str())
        .bind(doc_id)
        .bind(position as i32)
        .bind(&row.description)
        .bind(row.quantity)
        .bind(row.rate)
        .bind(row.tax_percent)
        .bind(row.taxable)
        .bind(row.tax)
        .bind(row.total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn delete_items(conn: &mut PgConnection, kind: DocumentKind, doc_id: i64) -> Result<(), BoxError> {
    sqlx::query("DELETE FROM document_items WHERE doc_kind = $1 AND doc_id = $2")
        .bind(kind.as_str())
        .bind(doc_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn totals_for(
    company_state: &str,
    place_of_supply: Option<&str>,
    items: &[LineItem],
) -> Result<DocumentTotals, AppError> {
    Ok(document_totals(items, supply_kind(company_state, place_of_supply))?)
}

async fn party_state(pool: &PgPool, table: &str, id: i64) -> Result<Option<Option<String>>, BoxError> {
    let row: Option<Option<String>> =
        sqlx::query_scalar(&format!("SELECT state_code FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row)
}

// ── Purchases ──

const PURCHASE_COLUMNS: &str = "id, supplier_id, tour_package_query_id, bill_number, bill_date, place_of_supply, \
     taxable_amount, cgst, sgst, igst, tax_amount, total_amount, notes, created_at, updated_at";

pub async fn list_purchases(
    pool: &PgPool,
    filter: DocumentFilter<'_>,
) -> Result<Vec<PurchaseDetail>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {PURCHASE_COLUMNS} FROM purchases
        WHERE ($1::BIGINT IS NULL OR supplier_id = $1)
          AND ($2::TEXT IS NULL OR bill_date >= $2)
          AND ($3::TEXT IS NULL OR bill_date <= $3)
        ORDER BY bill_date DESC, created_at DESC
        "#
    ))
    .bind(filter.party_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_purchase(pool: &PgPool, id: i64) -> Result<Option<PurchaseWithItems>, BoxError> {
    let purchase: Option<PurchaseDetail> =
        sqlx::query_as(&format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some(purchase) = purchase else {
        return Ok(None);
    };
    let items = load_items(pool, DocumentKind::Purchase, id).await?;
    Ok(Some(PurchaseWithItems { purchase, items }))
}

fn bill_error(e: sqlx::Error, bill_number: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::already_exists(format!("Bill {bill_number}")).into()
    } else if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::NotFound, "Referenced supplier or query not found").into()
    } else {
        e.into()
    }
}

pub async fn create_purchase(
    pool: &PgPool,
    company_state: &str,
    data: &PurchaseCreate,
) -> ServiceResult<PurchaseWithItems> {
    let bill_number = data.bill_number.trim();
    if bill_number.is_empty() {
        return Err(AppError::required("bill_number").into());
    }
    require_date("bill_date", &data.bill_date)?;
    let supplier_state = party_state(pool, "suppliers", data.supplier_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound).with_detail("supplier_id", data.supplier_id))?;
    let place = data.place_of_supply.clone().or(supplier_state);
    let totals = totals_for(company_state, place.as_deref(), &data.items)?;

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO purchases (id, supplier_id, tour_package_query_id, bill_number, bill_date, place_of_supply,
                               taxable_amount, cgst, sgst, igst, tax_amount, total_amount, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
        "#,
    )
    .bind(id)
    .bind(data.supplier_id)
    .bind(data.tour_package_query_id)
    .bind(bill_number)
    .bind(data.bill_date.trim())
    .bind(&place)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| bill_error(e, bill_number))?;
    replace_items(&mut tx, DocumentKind::Purchase, id, &data.items, &totals).await?;
    tx.commit().await?;

    tracing::info!(purchase_id = id, bill_number, total = totals.total, "Purchase recorded");
    get_purchase(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound).into())
}

pub async fn update_purchase(
    pool: &PgPool,
    company_state: &str,
    id: i64,
    data: &PurchaseUpdate,
) -> ServiceResult<PurchaseWithItems> {
    let current = get_purchase(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound))?;
    if let Some(date) = &data.bill_date {
        require_date("bill_date", date)?;
    }
    let place = data
        .place_of_supply
        .clone()
        .or_else(|| current.purchase.place_of_supply.clone());
    let items: Vec<LineItem> = match &data.items {
        Some(items) => items.clone(),
        None => current.items.iter().map(line_of).collect(),
    };
    let totals = totals_for(company_state, place.as_deref(), &items)?;

    let mut tx = pool.begin().await?;
    let returned = returned_total(&mut tx, "purchase_returns", "purchase_id", id).await?;
    check_return(totals.total, 0.0, returned).map_err(|_| {
        AppError::with_message(
            ErrorCode::ReturnExceedsOriginal,
            "New total is below the amount already returned",
        )
        .with_detail("returned", returned)
    })?;

    let bill_number = data.bill_number.as_deref().map(str::trim);
    sqlx::query(
        r#"
        UPDATE purchases SET
            bill_number = COALESCE($1, bill_number),
            bill_date = COALESCE($2, bill_date),
            place_of_supply = $3,
            tour_package_query_id = COALESCE($4, tour_package_query_id),
            taxable_amount = $5, cgst = $6, sgst = $7, igst = $8, tax_amount = $9, total_amount = $10,
            notes = COALESCE($11, notes),
            updated_at = $12
        WHERE id = $13
        "#,
    )
    .bind(bill_number)
    .bind(&data.bill_date)
    .bind(&place)
    .bind(data.tour_package_query_id)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| bill_error(e, bill_number.unwrap_or(&current.purchase.bill_number)))?;
    replace_items(&mut tx, DocumentKind::Purchase, id, &items, &totals).await?;
    tx.commit().await?;

    get_purchase(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound).into())
}

pub async fn delete_purchase(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        DELETE FROM document_items
        WHERE doc_kind = 'purchase_return'
          AND doc_id IN (SELECT id FROM purchase_returns WHERE purchase_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let rows = sqlx::query("DELETE FROM purchases WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    delete_items(&mut tx, DocumentKind::Purchase, id).await?;
    tx.commit().await?;
    Ok(true)
}

// ── Sales ──

const SALE_COLUMNS: &str = "id, customer_id, tour_package_query_id, invoice_number, invoice_date, place_of_supply, \
     taxable_amount, cgst, sgst, igst, tax_amount, total_amount, notes, created_at, updated_at";

pub async fn list_sales(pool: &PgPool, filter: DocumentFilter<'_>) -> Result<Vec<SaleDetail>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {SALE_COLUMNS} FROM sales
        WHERE ($1::BIGINT IS NULL OR customer_id = $1)
          AND ($2::TEXT IS NULL OR invoice_date >= $2)
          AND ($3::TEXT IS NULL OR invoice_date <= $3)
        ORDER BY invoice_date DESC, created_at DESC
        "#
    ))
    .bind(filter.party_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_sale(pool: &PgPool, id: i64) -> Result<Option<SaleWithItems>, BoxError> {
    let sale: Option<SaleDetail> =
        sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some(sale) = sale else {
        return Ok(None);
    };
    let items = load_items(pool, DocumentKind::Sale, id).await?;
    Ok(Some(SaleWithItems { sale, items }))
}

fn invoice_error(e: sqlx::Error, number: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::already_exists(format!("Invoice {number}")).into()
    } else if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::NotFound, "Referenced customer or query not found").into()
    } else {
        e.into()
    }
}

/// Record a sale; without an explicit number the next `INV/<FY>/<seq>` is issued
pub async fn create_sale(
    pool: &PgPool,
    company_state: &str,
    data: &SaleCreate,
) -> ServiceResult<SaleWithItems> {
    let date = require_date("invoice_date", &data.invoice_date)?;
    let customer_state = party_state(pool, "customers", data.customer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound).with_detail("customer_id", data.customer_id))?;
    let place = data.place_of_supply.clone().or(customer_state);
    let totals = totals_for(company_state, place.as_deref(), &data.items)?;

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;
    let number = match data.invoice_number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => {
            let seq: i64 = sqlx::query_scalar("SELECT nextval('invoice_number_seq')")
                .fetch_one(&mut *tx)
                .await?;
            invoice_number(&financial_year(date), seq)
        }
    };
    sqlx::query(
        r#"
        INSERT INTO sales (id, customer_id, tour_package_query_id, invoice_number, invoice_date, place_of_supply,
                           taxable_amount, cgst, sgst, igst, tax_amount, total_amount, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
        "#,
    )
    .bind(id)
    .bind(data.customer_id)
    .bind(data.tour_package_query_id)
    .bind(&number)
    .bind(data.invoice_date.trim())
    .bind(&place)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| invoice_error(e, &number))?;
    replace_items(&mut tx, DocumentKind::Sale, id, &data.items, &totals).await?;
    tx.commit().await?;

    tracing::info!(sale_id = id, invoice_number = %number, total = totals.total, "Sale recorded");
    get_sale(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound).into())
}

pub async fn update_sale(
    pool: &PgPool,
    company_state: &str,
    id: i64,
    data: &SaleUpdate,
) -> ServiceResult<SaleWithItems> {
    let current = get_sale(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound))?;
    if let Some(date) = &data.invoice_date {
        require_date("invoice_date", date)?;
    }
    let place = data
        .place_of_supply
        .clone()
        .or_else(|| current.sale.place_of_supply.clone());
    let items: Vec<LineItem> = match &data.items {
        Some(items) => items.clone(),
        None => current.items.iter().map(line_of).collect(),
    };
    let totals = totals_for(company_state, place.as_deref(), &items)?;

    let mut tx = pool.begin().await?;
    let returned = returned_total(&mut tx, "sale_returns", "sale_id", id).await?;
    check_return(totals.total, 0.0, returned).map_err(|_| {
        AppError::with_message(
            ErrorCode::ReturnExceedsOriginal,
            "New total is below the amount already returned",
        )
        .with_detail("returned", returned)
    })?;

    sqlx::query(
        r#"
        UPDATE sales SET
            invoice_date = COALESCE($1, invoice_date),
            place_of_supply = $2,
            tour_package_query_id = COALESCE($3, tour_package_query_id),
            taxable_amount = $4, cgst = $5, sgst = $6, igst = $7, tax_amount = $8, total_amount = $9,
            notes = COALESCE($10, notes),
            updated_at = $11
        WHERE id = $12
        "#,
    )
    .bind(&data.invoice_date)
    .bind(&place)
    .bind(data.tour_package_query_id)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await?;
    replace_items(&mut tx, DocumentKind::Sale, id, &items, &totals).await?;
    tx.commit().await?;

    get_sale(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SaleNotFound).into())
}

pub async fn delete_sale(pool: &PgPool, id: i64) -> Result<bool, BoxError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        DELETE FROM document_items
        WHERE doc_kind = 'sale_return'
          AND doc_id IN (SELECT id FROM sale_returns WHERE sale_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let rows = sqlx::query("DELETE FROM sales WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    delete_items(&mut tx, DocumentKind::Sale, id).await?;
    tx.commit().await?;
    Ok(true)
}

fn line_of(item: &DocumentItem) -> LineItem {
    LineItem {
        description: item.description.clone(),
        quantity: item.quantity,
        rate: item.rate,
        tax_percent: item.tax_percent,
    }
}

async fn returned_total(
    conn: &mut PgConnection,
    table: &str,
    parent_column: &str,
    parent_id: i64,
) -> Result<f64, BoxError> {
    let total: f64 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(SUM(total_amount), 0)::DOUBLE PRECISION FROM {table} WHERE {parent_column} = $1"
    ))
    .bind(parent_id)
    .fetch_one(conn)
    .await?;
    Ok(total)
}

// ── Returns ──

const PURCHASE_RETURN_COLUMNS: &str = "id, purchase_id, supplier_id, return_date, reason, taxable_amount, \
     cgst, sgst, igst, tax_amount, total_amount, created_at";
const SALE_RETURN_COLUMNS: &str = "id, sale_id, customer_id, return_date, reason, taxable_amount, \
     cgst, sgst, igst, tax_amount, total_amount, created_at";

/// Lock the original, price the return with its supply kind, check the remaining returnable amount
async fn prepare_return(
    conn: &mut PgConnection,
    company_state: &str,
    kind: DocumentKind,
    data: &ReturnCreate,
) -> ServiceResult<DocumentTotals> {
    require_date("return_date", &data.return_date)?;
    let (source_sql, returns_table, parent_column, missing) = match kind {
        DocumentKind::PurchaseReturn => (
            "SELECT place_of_supply, total_amount FROM purchases WHERE id = $1 FOR UPDATE",
            "purchase_returns",
            "purchase_id",
            ErrorCode::PurchaseNotFound,
        ),
        _ => (
            "SELECT place_of_supply, total_amount FROM sales WHERE id = $1 FOR UPDATE",
            "sale_returns",
            "sale_id",
            ErrorCode::SaleNotFound,
        ),
    };
    let source: Option<(Option<String>, f64)> = sqlx::query_as(source_sql)
        .bind(data.document_id)
        .fetch_optional(&mut *conn)
        .await?;
    let (place_of_supply, original_total) =
        source.ok_or_else(|| AppError::new(missing).with_detail("document_id", data.document_id))?;

    let totals = totals_for(company_state, place_of_supply.as_deref(), &data.items)?;
    let returned = returned_total(conn, returns_table, parent_column, data.document_id).await?;
    check_return(original_total, returned, totals.total).map_err(AppError::from)?;
    Ok(totals)
}

pub async fn create_purchase_return(
    pool: &PgPool,
    company_state: &str,
    data: &ReturnCreate,
) -> ServiceResult<ReturnWithItems<PurchaseReturn>> {
    let mut tx = pool.begin().await?;
    let totals = prepare_return(&mut tx, company_state, DocumentKind::PurchaseReturn, data).await?;
    let id = snowflake_id();
    let header: PurchaseReturn = sqlx::query_as(&format!(
        r#"
        INSERT INTO purchase_returns (id, purchase_id, supplier_id, return_date, reason, taxable_amount,
                                      cgst, sgst, igst, tax_amount, total_amount, created_at)
        SELECT $1, p.id, p.supplier_id, $2, $3, $4, $5, $6, $7, $8, $9, $10
        FROM purchases p WHERE p.id = $11
        RETURNING {PURCHASE_RETURN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(data.return_date.trim())
    .bind(&data.reason)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(now_millis())
    .bind(data.document_id)
    .fetch_one(&mut *tx)
    .await?;
    replace_items(&mut tx, DocumentKind::PurchaseReturn, id, &data.items, &totals).await?;
    let items = load_items(&mut *tx, DocumentKind::PurchaseReturn, id).await?;
    tx.commit().await?;

    tracing::info!(return_id = id, purchase_id = data.document_id, total = totals.total, "Purchase return recorded");
    Ok(ReturnWithItems { header, items })
}

pub async fn create_sale_return(
    pool: &PgPool,
    company_state: &str,
    data: &ReturnCreate,
) -> ServiceResult<ReturnWithItems<SaleReturn>> {
    let mut tx = pool.begin().await?;
    let totals = prepare_return(&mut tx, company_state, DocumentKind::SaleReturn, data).await?;
    let id = snowflake_id();
    let header: SaleReturn = sqlx::query_as(&format!(
        r#"
        INSERT INTO sale_returns (id, sale_id, customer_id, return_date, reason, taxable_amount,
                                  cgst, sgst, igst, tax_amount, total_amount, created_at)
        SELECT $1, s.id, s.customer_id, $2, $3, $4, $5, $6, $7, $8, $9, $10
        FROM sales s WHERE s.id = $11
        RETURNING {SALE_RETURN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(data.return_date.trim())
    .bind(&data.reason)
    .bind(totals.taxable)
    .bind(totals.cgst)
    .bind(totals.sgst)
    .bind(totals.igst)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(now_millis())
    .bind(data.document_id)
    .fetch_one(&mut *tx)
    .await?;
    replace_items(&mut tx, DocumentKind::SaleReturn, id, &data.items, &totals).await?;
    let items = load_items(&mut *tx, DocumentKind::SaleReturn, id).await?;
    tx.commit().await?;

    tracing::info!(return_id = id, sale_id = data.document_id, total = totals.total, "Sale return recorded");
    Ok(ReturnWithItems { header, items })
}

pub async fn list_purchase_returns(
    pool: &PgPool,
    filter: DocumentFilter<'_>,
) -> Result<Vec<PurchaseReturn>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {PURCHASE_RETURN_COLUMNS} FROM purchase_returns
        WHERE ($1::BIGINT IS NULL OR supplier_id = $1)
          AND ($2::TEXT IS NULL OR return_date >= $2)
          AND ($3::TEXT IS NULL OR return_date <= $3)
        ORDER BY return_date DESC, created_at DESC
        "#
    ))
    .bind(filter.party_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_sale_returns(
    pool: &PgPool,
    filter: DocumentFilter<'_>,
) -> Result<Vec<SaleReturn>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {SALE_RETURN_COLUMNS} FROM sale_returns
        WHERE ($1::BIGINT IS NULL OR customer_id = $1)
          AND ($2::TEXT IS NULL OR return_date >= $2)
          AND ($3::TEXT IS NULL OR return_date <= $3)
        ORDER BY return_date DESC, created_at DESC
        "#
    ))
    .bind(filter.party_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_purchase_return(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ReturnWithItems<PurchaseReturn>>, BoxError> {
    let header: Option<PurchaseReturn> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_RETURN_COLUMNS} FROM purchase_returns WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(header) = header else {
        return Ok(None);
    };
    let items = load_items(pool, DocumentKind::PurchaseReturn, id).await?;
    Ok(Some(ReturnWithItems { header, items }))
}

pub async fn get_sale_return(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ReturnWithItems<SaleReturn>>, BoxError> {
    let header: Option<SaleReturn> = sqlx::query_as(&format!(
        "SELECT {SALE_RETURN_COLUMNS} FROM sale_returns WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(header) = header else {
        return Ok(None);
    };
    let items = load_items(pool, DocumentKind::SaleReturn, id).await?;
    Ok(Some(ReturnWithItems { header, items }))
}

/// Delete a purchase or sale return with its lines
pub async fn delete_return(pool: &PgPool, kind: DocumentKind, id: i64) -> Result<bool, BoxError> {
    let table = match kind {
        DocumentKind::PurchaseReturn => "purchase_returns",
        DocumentKind::SaleReturn => "sale_returns",
        other => return Err(format!("{} is not a return", other.as_str()).into()),
    };
    let mut tx = pool.begin().await?;
    let rows = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }
    delete_items(&mut tx, kind, id).await?;
    tx.commit().await?;
    Ok(true)
}
