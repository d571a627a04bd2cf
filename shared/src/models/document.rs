//! Document line items shared by purchases, sales and returns

use serde::{Deserialize, Serialize};

use crate::invoice::{LineItem, LineTotals};

/// Parent document of a [`DocumentItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Purchase,
    Sale,
    PurchaseReturn,
    SaleReturn,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Purchase => "purchase",
            DocumentKind::Sale => "sale",
            DocumentKind::PurchaseReturn => "purchase_return",
            DocumentKind::SaleReturn => "sale_return",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DocumentItem {
    pub id: i64,
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub tax_percent: f64,
    pub taxable: f64,
    pub tax: f64,
    pub total: f64,
}

impl DocumentItem {
    pub fn from_line(id: i64, item: &LineItem, totals: &LineTotals) -> Self {
        Self {
            id,
            description: item.description.trim().to_string(),
            quantity: item.quantity,
            rate: item.rate,
            tax_percent: item.tax_percent,
            taxable: totals.taxable,
            tax: totals.tax,
            total: totals.total,
        }
    }
}
