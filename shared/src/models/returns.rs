//! Purchase / Sale Return Models (debit and credit notes)

use serde::{Deserialize, Serialize};

use super::document::DocumentItem;
use crate::invoice::LineItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseReturn {
    pub id: i64,
    pub purchase_id: i64,
    pub supplier_id: i64,
    /// YYYY-MM-DD
    pub return_date: String,
    pub reason: Option<String>,
    pub taxable_amount: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleReturn {
    pub id: i64,
    pub sale_id: i64,
    pub customer_id: i64,
    pub return_date: String,
    pub reason: Option<String>,
    pub taxable_amount: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnWithItems<T> {
    #[serde(flatten)]
    pub header: T,
    pub items: Vec<DocumentItem>,
}

/// Return payload; the parent document comes from the path or body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnCreate {
    /// Purchase or sale being returned against
    pub document_id: i64,
    pub return_date: String,
    pub reason: Option<String>,
    pub items: Vec<LineItem>,
}
