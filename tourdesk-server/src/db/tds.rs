//! TDS deductions recorded against supplier payments

use shared::error::{AppError, ErrorCode};
use shared::models::{TdsDeposit, TdsSummaryRow, TdsTransaction};
use shared::tds::financial_year_bounds;
use sqlx::PgPool;

use super::{BoxError, require_date};
use crate::error::ServiceResult;

const TDS_COLUMNS: &str = "id, voucher_id, supplier_id, section, financial_year, quarter, deduction_date, pan, \
                           gross_amount, taxable_base, rate, tds_amount, due_date, challan_number, \
                           deposit_date, created_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct TdsFilter<'a> {
    pub financial_year: Option<&'a str>,
    pub supplier_id: Option<i64>,
    /// Only deductions not yet deposited
    pub pending_only: bool,
}

/// Reject labels that are not "YYYY-YY"
pub fn check_financial_year(label: &str) -> Result<(), AppError> {
    financial_year_bounds(label).map(|_| ()).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidFormat, "Financial year must look like 2025-26")
            .with_detail("fy", label)
    })
}

pub async fn list_transactions(pool: &PgPool, filter: TdsFilter<'_>) -> ServiceResult<Vec<TdsTransaction>> {
    if let Some(fy) = filter.financial_year {
        check_financial_year(fy)?;
    }
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {TDS_COLUMNS} FROM tds_transactions
        WHERE ($1::TEXT IS NULL OR financial_year = $1)
          AND ($2::BIGINT IS NULL OR supplier_id = $2)
          AND (NOT $3 OR challan_number IS NULL)
        ORDER BY deduction_date DESC, created_at DESC
        "#
    ))
    .bind(filter.financial_year)
    .bind(filter.supplier_id)
    .bind(filter.pending_only)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_transaction(pool: &PgPool, id: i64) -> Result<Option<TdsTransaction>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {TDS_COLUMNS} FROM tds_transactions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Record the challan a deduction was deposited under. A deposit is final.
pub async fn deposit(pool: &PgPool, id: i64, data: &TdsDeposit) -> ServiceResult<TdsTransaction> {
    let challan = data.challan_number.trim();
    if challan.is_empty() {
        return Err(AppError::required("challan_number").into());
    }
    let deposited_on = require_date("deposit_date", &data.deposit_date)?;

    let mut tx = pool.begin().await?;
    let current: TdsTransaction = sqlx::query_as(&format!(
        "SELECT {TDS_COLUMNS} FROM tds_transactions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::TdsTransactionNotFound).with_detail("id", id))?;

    if current.is_deposited() {
        return Err(AppError::new(ErrorCode::TdsAlreadyDeposited)
            .with_detail("challan_number", current.challan_number.unwrap_or_default())
            .into());
    }
    let deducted_on = require_date("deduction_date", &current.deduction_date)?;
    if deposited_on < deducted_on {
        return Err(AppError::validation("Deposit date is before the deduction date")
            .with_detail("deduction_date", current.deduction_date)
            .into());
    }

    let updated: TdsTransaction = sqlx::query_as(&format!(
        r#"
        UPDATE tds_transactions SET challan_number = $1, deposit_date = $2
        WHERE id = $3
        RETURNING {TDS_COLUMNS}
        "#
    ))
    .bind(challan)
    .bind(deposited_on.format("%Y-%m-%d").to_string())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    let late = deposited_on.format("%Y-%m-%d").to_string() > updated.due_date;
    if late {
        tracing::warn!(id, due_date = %updated.due_date, deposit_date = %data.deposit_date, "TDS deposited after due date");
    } else {
        tracing::info!(id, challan, "TDS deposit recorded");
    }
    Ok(updated)
}

/// Section × quarter totals for one financial year
pub async fn summary(pool: &PgPool, financial_year: &str) -> ServiceResult<Vec<TdsSummaryRow>> {
    check_financial_year(financial_year)?;
    let rows = sqlx::query_as(
        r#"
        SELECT section,
               quarter,
               COUNT(*) AS deductions,
               COALESCE(SUM(gross_amount), 0)::DOUBLE PRECISION AS gross_amount,
               COALESCE(SUM(tds_amount), 0)::DOUBLE PRECISION AS tds_amount,
               COALESCE(SUM(tds_amount) FILTER (WHERE challan_number IS NOT NULL), 0)::DOUBLE PRECISION
                   AS deposited_amount,
               COALESCE(SUM(tds_amount) FILTER (WHERE challan_number IS NULL), 0)::DOUBLE PRECISION
                   AS pending_amount
        FROM tds_transactions
        WHERE financial_year = $1
        GROUP BY section, quarter
        ORDER BY section, quarter
        "#,
    )
    .bind(financial_year)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_financial_year() {
        assert!(check_financial_year("2025-26").is_ok());
        assert!(check_financial_year("1999-00").is_ok());
        assert_eq!(check_financial_year("2025-27").unwrap_err().code, ErrorCode::InvalidFormat);
        assert!(check_financial_year("2025").is_err());
        assert!(check_financial_year("FY25-26").is_err());
    }
}
