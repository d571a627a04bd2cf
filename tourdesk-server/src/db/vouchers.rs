//! Payments, receipts, expenses, incomes and transfers
//!
//! Every voucher writes its ledger entries and recomputes the touched
//! account balances in one transaction.

use shared::error::{AppError, ErrorCode};
use shared::ledger::Direction;
use shared::models::{
    AccountRef, CashFlowCreate, PaymentCreate, ReceiptCreate, Supplier, TransferCreate, Voucher,
    VoucherKind,
};
use shared::money::require_positive;
use shared::tds::{
    TdsComputation, TdsInput, TdsSection, compute_tds, deposit_due_date, financial_year,
    find_section, quarter,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::ledger::{NewEntry, delete_entries, insert_entry, lock_account, recompute};
use super::parties::SUPPLIER_COLUMNS;
use super::{BoxError, require_date};
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation};

const VOUCHER_COLUMNS: &str = "id, kind, voucher_date, amount, bank_account_id, cash_account_id, \
     to_bank_account_id, to_cash_account_id, supplier_id, customer_id, purchase_id, sale_id, category, \
     mode, reference, description, tds_section, gross_amount, tds_amount, created_by, created_at";

/// Section value that switches TDS off for a payment
pub const NO_TDS: &str = "none";

#[derive(Debug, Default, Clone, Copy)]
pub struct VoucherFilter<'a> {
    pub supplier_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

pub async fn list(
    pool: &PgPool,
    kind: VoucherKind,
    filter: VoucherFilter<'_>,
) -> Result<Vec<Voucher>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {VOUCHER_COLUMNS} FROM vouchers
        WHERE kind = $1
          AND ($2::BIGINT IS NULL OR supplier_id = $2)
          AND ($3::BIGINT IS NULL OR customer_id = $3)
          AND ($4::TEXT IS NULL OR voucher_date >= $4)
          AND ($5::TEXT IS NULL OR voucher_date <= $5)
        ORDER BY voucher_date DESC, created_at DESC
        "#
    ))
    .bind(kind.as_str())
    .bind(filter.supplier_id)
    .bind(filter.customer_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, kind: VoucherKind, id: i64) -> Result<Option<Voucher>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = $1 AND kind = $2"
    ))
    .bind(id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

fn positive(value: f64, field: &str) -> Result<f64, AppError> {
    require_positive(value, field)
        .map(|_| value)
        .map_err(|msg| AppError::with_message(ErrorCode::AmountNotPositive, msg).with_detail("field", field))
}

fn reference_error(e: sqlx::Error) -> ServiceError {
    if is_foreign_key_violation(&e) {
        AppError::with_message(ErrorCode::NotFound, "Referenced party, document or account not found").into()
    } else {
        e.into()
    }
}

/// Voucher row fields; absent ones are NULL
#[derive(Default)]
struct VoucherRow<'a> {
    kind: Option<VoucherKind>,
    voucher_date: &'a str,
    amount: f64,
    account: Option<AccountRef>,
    to_account: Option<AccountRef>,
    supplier_id: Option<i64>,
    customer_id: Option<i64>,
    purchase_id: Option<i64>,
    sale_id: Option<i64>,
    category: Option<&'a str>,
    mode: Option<&'a str>,
    reference: Option<&'a str>,
    description: Option<&'a str>,
    tds_section: Option<&'a str>,
    gross_amount: Option<f64>,
    tds_amount: f64,
    created_by: Option<i64>,
}

async fn insert_voucher(conn: &mut PgConnection, row: &VoucherRow<'_>) -> ServiceResult<Voucher> {
    let kind = row
        .kind
        .ok_or_else(|| ServiceError::Db("voucher kind missing".into()))?;
    let (bank, cash) = row.account.map(|a| a.columns()).unwrap_or_default();
    let (to_bank, to_cash) = row.to_account.map(|a| a.columns()).unwrap_or_default();
    let voucher = sqlx::query_as(&format!(
        r#"
        INSERT INTO vouchers (id, kind, voucher_date, amount, bank_account_id, cash_account_id,
                              to_bank_account_id, to_cash_account_id, supplier_id, customer_id, purchase_id,
                              sale_id, category, mode, reference, description, tds_section, gross_amount,
                              tds_amount, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        RETURNING {VOUCHER_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(kind.as_str())
    .bind(row.voucher_date.trim())
    .bind(row.amount)
    .bind(bank)
    .bind(cash)
    .bind(to_bank)
    .bind(to_cash)
    .bind(row.supplier_id)
    .bind(row.customer_id)
    .bind(row.purchase_id)
    .bind(row.sale_id)
    .bind(row.category)
    .bind(row.mode)
    .bind(row.reference)
    .bind(row.description)
    .bind(row.tds_section)
    .bind(row.gross_amount)
    .bind(row.tds_amount)
    .bind(row.created_by)
    .bind(now_millis())
    .fetch_one(conn)
    .await
    .map_err(reference_error)?;
    Ok(voucher)
}

/// Book one movement against an account and refresh its balance
async fn post(
    conn: &mut PgConnection,
    voucher: &Voucher,
    account: AccountRef,
    direction: Direction,
) -> ServiceResult<()> {
    insert_entry(
        conn,
        &NewEntry {
            account,
            entry_date: &voucher.voucher_date,
            direction,
            amount: voucher.amount,
            source: &voucher.kind,
            source_id: voucher.id,
            description: voucher.description.as_deref(),
        },
    )
    .await?;
    recompute(conn, account).await?;
    Ok(())
}

// ── Payments ──

/// Payments made to a supplier under a section in the financial year so far
async fn prior_tds_totals(
    conn: &mut PgConnection,
    supplier_id: i64,
    section: &str,
    fy: &str,
) -> Result<(f64, f64), BoxError> {
    let row: (f64, f64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(gross_amount), 0)::DOUBLE PRECISION,
               COALESCE(SUM(taxable_base), 0)::DOUBLE PRECISION
        FROM tds_transactions
        WHERE supplier_id = $1 AND section = $2 AND financial_year = $3
        "#,
    )
    .bind(supplier_id)
    .bind(section)
    .bind(fy)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Section for a payment: explicit, else the supplier's default; `none` disables TDS.
///
/// Resolved against the rate master so lookups and stored rows share the canonical code.
fn payment_section(
    requested: Option<&str>,
    supplier: &Supplier,
) -> Result<Option<&'static TdsSection>, AppError> {
    let Some(code) = requested
        .or(supplier.default_tds_section.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(NO_TDS))
    else {
        return Ok(None);
    };
    find_section(code)
        .map(Some)
        .ok_or_else(|| AppError::new(ErrorCode::TdsSectionUnknown).with_detail("section", code))
}

#[derive(Debug, serde::Serialize)]
pub struct PaymentResult {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub tds: Option<TdsComputation>,
}

/// Pay a supplier. With a TDS section the tax is withheld from the gross,
/// a `tds_transactions` row is recorded, and only the net leaves the account.
pub async fn create_payment(
    pool: &PgPool,
    data: &PaymentCreate,
    created_by: Option<i64>,
) -> ServiceResult<PaymentResult> {
    let date = require_date("voucher_date", &data.voucher_date)?;
    let gross = positive(data.gross_amount, "gross_amount")?;

    let mut tx = pool.begin().await?;
    let supplier: Supplier = sqlx::query_as(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 FOR UPDATE"
    ))
    .bind(data.supplier_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound).with_detail("supplier_id", data.supplier_id))?;
    lock_account(&mut tx, data.account).await?;

    let fy = financial_year(date);
    let tds = match payment_section(data.tds_section.as_deref(), &supplier)? {
        Some(section) => {
            let (prior_aggregate, prior_taxed_base) =
                prior_tds_totals(&mut tx, supplier.id, section.code, &fy).await?;
            let computation = compute_tds(&TdsInput {
                section: section.code.to_string(),
                deductee_kind: supplier.deductee_kind(),
                pan: supplier.pan.clone(),
                amount: gross,
                prior_aggregate,
                prior_taxed_base,
            })
            .map_err(AppError::from)?;
            Some(computation)
        }
        None => None,
    };
    let tds_amount = tds.as_ref().map_or(0.0, |t| t.tds_amount);
    let net = tds.as_ref().map_or(gross, |t| t.net_payable);
    if net <= 0.0 {
        return Err(AppError::with_message(ErrorCode::AmountNotPositive, "Net payable after TDS is zero").into());
    }

    let voucher = insert_voucher(
        &mut tx,
        &VoucherRow {
            kind: Some(VoucherKind::Payment),
            voucher_date: &data.voucher_date,
            amount: net,
            account: Some(data.account),
            supplier_id: Some(supplier.id),
            purchase_id: data.purchase_id,
            mode: data.mode.as_deref(),
            reference: data.reference.as_deref(),
            description: data.description.as_deref(),
            tds_section: tds.as_ref().map(|t| t.section.as_str()),
            gross_amount: Some(gross),
            tds_amount,
            created_by,
            ..Default::default()
        },
    )
    .await?;

    if let Some(t) = &tds {
        sqlx::query(
            r#"
            INSERT INTO tds_transactions (id, voucher_id, supplier_id, section, financial_year, quarter,
                                          deduction_date, pan, gross_amount, taxable_base, rate, tds_amount,
                                          due_date, challan_number, deposit_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NULL, NULL, $14)
            "#,
        )
        .bind(snowflake_id())
        .bind(voucher.id)
        .bind(supplier.id)
        .bind(&t.section)
        .bind(&fy)
        .bind(i16::from(quarter(date)))
        .bind(&voucher.voucher_date)
        .bind(&supplier.pan)
        .bind(gross)
        .bind(t.taxable_base)
        .bind(t.rate)
        .bind(t.tds_amount)
        .bind(deposit_due_date(date).format("%Y-%m-%d").to_string())
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;
    }

    post(&mut tx, &voucher, data.account, Direction::Outflow).await?;
    tx.commit().await?;

    tracing::info!(
        voucher_id = voucher.id,
        supplier_id = supplier.id,
        gross,
        tds = tds_amount,
        net,
        "Supplier payment recorded"
    );
    Ok(PaymentResult { voucher, tds })
}

// ── Receipts ──

pub async fn create_receipt(
    pool: &PgPool,
    data: &ReceiptCreate,
    created_by: Option<i64>,
) -> ServiceResult<Voucher> {
    require_date("voucher_date", &data.voucher_date)?;
    let amount = positive(data.amount, "amount")?;

    let mut tx = pool.begin().await?;
    lock_account(&mut tx, data.account).await?;
    let voucher = insert_voucher(
        &mut tx,
        &VoucherRow {
            kind: Some(VoucherKind::Receipt),
            voucher_date: &data.voucher_date,
            amount,
            account: Some(data.account),
            customer_id: Some(data.customer_id),
            sale_id: data.sale_id,
            mode: data.mode.as_deref(),
            reference: data.reference.as_deref(),
            description: data.description.as_deref(),
            created_by,
            ..Default::default()
        },
    )
    .await?;
    post(&mut tx, &voucher, data.account, Direction::Inflow).await?;
    tx.commit().await?;

    tracing::info!(voucher_id = voucher.id, customer_id = data.customer_id, amount, "Receipt recorded");
    Ok(voucher)
}

// ── Expenses and incomes ──

/// Expense (outflow) or income (inflow) booked under a free-text category
pub async fn create_cash_flow(
    pool: &PgPool,
    kind: VoucherKind,
    data: &CashFlowCreate,
    created_by: Option<i64>,
) -> ServiceResult<Voucher> {
    let direction = match kind {
        VoucherKind::Expense => Direction::Outflow,
        VoucherKind::Income => Direction::Inflow,
        other => {
            return Err(AppError::invalid_request(format!("{} is not a cash-flow voucher", other.as_str())).into());
        }
    };
    require_date("voucher_date", &data.voucher_date)?;
    let amount = positive(data.amount, "amount")?;
    let category = data.category.trim();
    if category.is_empty() {
        return Err(AppError::required("category").into());
    }

    let mut tx = pool.begin().await?;
    lock_account(&mut tx, data.account).await?;
    let voucher = insert_voucher(
        &mut tx,
        &VoucherRow {
            kind: Some(kind),
            voucher_date: &data.voucher_date,
            amount,
            account: Some(data.account),
            supplier_id: data.supplier_id,
            customer_id: data.customer_id,
            category: Some(category),
            mode: data.mode.as_deref(),
            reference: data.reference.as_deref(),
            description: data.description.as_deref(),
            created_by,
            ..Default::default()
        },
    )
    .await?;
    post(&mut tx, &voucher, data.account, direction).await?;
    tx.commit().await?;

    tracing::info!(voucher_id = voucher.id, kind = kind.as_str(), category, amount, "Voucher recorded");
    Ok(voucher)
}

// ── Transfers ──

/// Move money between two accounts (bank↔bank, bank↔cash, cash↔cash)
pub async fn create_transfer(
    pool: &PgPool,
    data: &TransferCreate,
    created_by: Option<i64>,
) -> ServiceResult<Voucher> {
    if data.from == data.to {
        return Err(AppError::new(ErrorCode::TransferSameAccount).into());
    }
    require_date("voucher_date", &data.voucher_date)?;
    let amount = positive(data.amount, "amount")?;

    let mut tx = pool.begin().await?;
    // Fixed lock order so two opposite transfers cannot deadlock
    let (first, second) = if (data.from.kind.as_str(), data.from.id) <= (data.to.kind.as_str(), data.to.id) {
        (data.from, data.to)
    } else {
        (data.to, data.from)
    };
    lock_account(&mut tx, first).await?;
    lock_account(&mut tx, second).await?;

    let voucher = insert_voucher(
        &mut tx,
        &VoucherRow {
            kind: Some(VoucherKind::Transfer),
            voucher_date: &data.voucher_date,
            amount,
            account: Some(data.from),
            to_account: Some(data.to),
            reference: data.reference.as_deref(),
            description: data.description.as_deref(),
            created_by,
            ..Default::default()
        },
    )
    .await?;
    post(&mut tx, &voucher, data.from, Direction::Outflow).await?;
    post(&mut tx, &voucher, data.to, Direction::Inflow).await?;
    tx.commit().await?;

    tracing::info!(voucher_id = voucher.id, amount, "Transfer recorded");
    Ok(voucher)
}

// ── Delete ──

/// Delete a voucher, its entries and TDS row, then refresh the touched balances.
///
/// A payment whose TDS has been deposited is kept.
pub async fn delete(pool: &PgPool, kind: VoucherKind, id: i64) -> ServiceResult<bool> {
    let mut tx = pool.begin().await?;
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM vouchers WHERE id = $1 AND kind = $2 FOR UPDATE")
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Ok(false);
    }

    let deposited: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM tds_transactions WHERE voucher_id = $1 AND challan_number IS NOT NULL)",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if deposited {
        return Err(AppError::new(ErrorCode::TdsAlreadyDeposited)
            .with_detail("voucher_id", id)
            .into());
    }

    let accounts = delete_entries(&mut tx, kind.as_str(), id).await?;
    sqlx::query("DELETE FROM vouchers WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for account in accounts {
        recompute(&mut tx, account).await?;
    }
    tx.commit().await?;

    tracing::info!(voucher_id = id, kind = kind.as_str(), "Voucher deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier(default_section: Option<&str>) -> Supplier {
        Supplier {
            id: 1,
            name: "Green Valley Resorts".into(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
            state_code: Some("32".into()),
            gstin: None,
            pan: Some("ABCDE1234F".into()),
            deductee_kind: "company".into(),
            default_tds_section: default_section.map(String::from),
            opening_balance: 0.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn section_code(requested: Option<&str>, supplier: &Supplier) -> Option<&'static str> {
        payment_section(requested, supplier).unwrap().map(|s| s.code)
    }

    #[test]
    fn test_payment_section() {
        let with_default = supplier(Some("194C"));
        assert_eq!(section_code(None, &with_default), Some("194C"));
        assert_eq!(section_code(Some("194J(b)"), &with_default), Some("194J(b)"));
        assert_eq!(section_code(Some("none"), &with_default), None);
        assert_eq!(section_code(Some("  "), &with_default), None);
        assert_eq!(section_code(None, &supplier(None)), None);
    }

    #[test]
    fn test_payment_section_is_canonical() {
        // Aggregates are summed by the stored code, so lookups must use it too
        assert_eq!(section_code(None, &supplier(Some("194c"))), Some("194C"));
        assert_eq!(section_code(Some(" 194j(b) "), &supplier(None)), Some("194J(b)"));

        let err = payment_section(Some("194J"), &supplier(None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::TdsSectionUnknown);
    }

    #[test]
    fn test_positive() {
        assert_eq!(positive(10.5, "amount").unwrap(), 10.5);
        assert_eq!(positive(0.0, "amount").unwrap_err().code, ErrorCode::AmountNotPositive);
        assert!(positive(-5.0, "amount").is_err());
        assert!(positive(f64::NAN, "amount").is_err());
    }
}
