//! TDS Transaction Model

use serde::{Deserialize, Serialize};

/// One deduction withheld on a supplier payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TdsTransaction {
    pub id: i64,
    pub voucher_id: i64,
    pub supplier_id: i64,
    pub section: String,
    /// "2025-26"
    pub financial_year: String,
    /// 1..=4
    pub quarter: i16,
    /// YYYY-MM-DD
    pub deduction_date: String,
    pub pan: Option<String>,
    pub gross_amount: f64,
    pub taxable_base: f64,
    pub rate: f64,
    pub tds_amount: f64,
    pub due_date: String,
    pub challan_number: Option<String>,
    pub deposit_date: Option<String>,
    pub created_at: i64,
}

impl TdsTransaction {
    pub fn is_deposited(&self) -> bool {
        self.challan_number.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdsDeposit {
    pub challan_number: String,
    /// YYYY-MM-DD
    pub deposit_date: String,
}

/// Section-wise totals for a financial year
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TdsSummaryRow {
    pub section: String,
    pub quarter: i16,
    pub deductions: i64,
    pub gross_amount: f64,
    pub tds_amount: f64,
    pub deposited_amount: f64,
    pub pending_amount: f64,
}
