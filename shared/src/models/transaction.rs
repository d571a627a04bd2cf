//! Voucher Models (payments, receipts, expenses, incomes, transfers)
//!
//! Every voucher moves money through one bank or cash account (two for a
//! transfer) and produces ledger entries against it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// To a supplier (outflow, TDS may be withheld)
    Payment,
    /// From a customer (inflow)
    Receipt,
    Expense,
    Income,
    Transfer,
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::Payment => "payment",
            VoucherKind::Receipt => "receipt",
            VoucherKind::Expense => "expense",
            VoucherKind::Income => "income",
            VoucherKind::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAccountKind {
    Bank,
    Cash,
}

impl LedgerAccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerAccountKind::Bank => "bank",
            LedgerAccountKind::Cash => "cash",
        }
    }
}

/// A bank or cash account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub kind: LedgerAccountKind,
    pub id: i64,
}

impl AccountRef {
    pub fn bank(id: i64) -> Self {
        Self {
            kind: LedgerAccountKind::Bank,
            id,
        }
    }

    pub fn cash(id: i64) -> Self {
        Self {
            kind: LedgerAccountKind::Cash,
            id,
        }
    }

    /// (bank_account_id, cash_account_id) column pair
    pub fn columns(&self) -> (Option<i64>, Option<i64>) {
        match self.kind {
            LedgerAccountKind::Bank => (Some(self.id), None),
            LedgerAccountKind::Cash => (None, Some(self.id)),
        }
    }

    /// Inverse of [`AccountRef::columns`]; exactly one side must be set
    pub fn from_columns(bank: Option<i64>, cash: Option<i64>) -> Option<Self> {
        match (bank, cash) {
            (Some(id), None) => Some(Self::bank(id)),
            (None, Some(id)) => Some(Self::cash(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Voucher {
    pub id: i64,
    pub kind: String,
    /// YYYY-MM-DD
    pub voucher_date: String,
    /// Amount moved through the account (net of TDS for payments)
    pub amount: f64,
    pub bank_account_id: Option<i64>,
    pub cash_account_id: Option<i64>,
    /// Destination side of a transfer
    pub to_bank_account_id: Option<i64>,
    pub to_cash_account_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub purchase_id: Option<i64>,
    pub sale_id: Option<i64>,
    /// Expense / income head
    pub category: Option<String>,
    /// neft, upi, cheque, cash...
    pub mode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub tds_section: Option<String>,
    /// Gross amount before TDS (payments)
    pub gross_amount: Option<f64>,
    pub tds_amount: f64,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub supplier_id: i64,
    pub purchase_id: Option<i64>,
    pub voucher_date: String,
    /// Gross amount settled; the account is charged gross minus TDS
    pub gross_amount: f64,
    pub account: AccountRef,
    /// Falls back to the supplier's default section; `"none"` disables TDS
    pub tds_section: Option<String>,
    pub mode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptCreate {
    pub customer_id: i64,
    pub sale_id: Option<i64>,
    pub voucher_date: String,
    pub amount: f64,
    pub account: AccountRef,
    pub mode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
}

/// Expense or income voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowCreate {
    pub category: String,
    pub voucher_date: String,
    pub amount: f64,
    pub account: AccountRef,
    pub supplier_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub mode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCreate {
    pub voucher_date: String,
    pub amount: f64,
    pub from: AccountRef,
    pub to: AccountRef,
    pub reference: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_ref_columns() {
        assert_eq!(AccountRef::bank(5).columns(), (Some(5), None));
        assert_eq!(AccountRef::cash(9).columns(), (None, Some(9)));
        assert_eq!(AccountRef::from_columns(Some(5), None), Some(AccountRef::bank(5)));
        assert_eq!(AccountRef::from_columns(Some(5), Some(9)), None);
        assert_eq!(AccountRef::from_columns(None, None), None);
    }

    #[test]
    fn test_account_ref_serde() {
        let r: AccountRef = serde_json::from_str(r#"{"kind":"cash","id":3}"#).unwrap();
        assert_eq!(r, AccountRef::cash(3));
    }
}
