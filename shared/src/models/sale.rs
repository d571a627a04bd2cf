//! Sale Model (customer invoice)

use serde::{Deserialize, Serialize};

use super::document::DocumentItem;
use crate::invoice::LineItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub id: i64,
    pub customer_id: i64,
    pub tour_package_query_id: Option<i64>,
    pub invoice_number: String,
    /// YYYY-MM-DD
    pub invoice_date: String,
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
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: SaleDetail,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub customer_id: i64,
    pub tour_package_query_id: Option<i64>,
    /// Generated when absent
    pub invoice_number: Option<String>,
    pub invoice_date: String,
    pub place_of_supply: Option<String>,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub invoice_date: Option<String>,
    pub place_of_supply: Option<String>,
    pub tour_package_query_id: Option<i64>,
    pub items: Option<Vec<LineItem>>,
    pub notes: Option<String>,
}

/// `INV/{fy}/{sequence:05}`
pub fn invoice_number(financial_year: &str, sequence: i64) -> String {
    format!("INV/{financial_year}/{sequence:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number() {
        assert_eq!(invoice_number("2025-26", 7), "INV/2025-26/00007");
    }
}
