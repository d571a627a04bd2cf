//! Purchase Model (supplier bill)

use serde::{Deserialize, Serialize};

use super::document::DocumentItem;
use crate::invoice::LineItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseDetail {
    pub id: i64,
    pub supplier_id: i64,
    pub tour_package_query_id: Option<i64>,
    pub bill_number: String,
    /// YYYY-MM-DD
    pub bill_date: String,
    /// GST state code of the supplier when different from ours
    pub place_of_supply: Option<String>,
    pub taxable_amount: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub purchase: PurchaseDetail,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCreate {
    pub supplier_id: i64,
    pub tour_package_query_id: Option<i64>,
    pub bill_number: String,
    pub bill_date: String,
    pub place_of_supply: Option<String>,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
}

/// Replaces header fields and, when present, all items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseUpdate {
    pub bill_number: Option<String>,
    pub bill_date: Option<String>,
    pub place_of_supply: Option<String>,
    pub tour_package_query_id: Option<i64>,
    pub items: Option<Vec<LineItem>>,
    pub notes: Option<String>,
}
