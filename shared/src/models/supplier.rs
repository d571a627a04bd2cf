//! Supplier Model (hotels, transporters, guides, DMCs)

use serde::{Deserialize, Serialize};

use crate::tds::DeducteeKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    /// individual, huf, company, firm, other
    pub deductee_kind: String,
    /// Section applied to payments unless the payment names one
    pub default_tds_section: Option<String>,
    /// Payable carried over (positive = we owe them)
    pub opening_balance: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Supplier {
    pub fn deductee_kind(&self) -> DeducteeKind {
        self.deductee_kind.parse().unwrap_or(DeducteeKind::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierCreate {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub deductee_kind: Option<DeducteeKind>,
    pub default_tds_section: Option<String>,
    #[serde(default)]
    pub opening_balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub deductee_kind: Option<DeducteeKind>,
    pub default_tds_section: Option<String>,
    pub opening_balance: Option<f64>,
}
