//! Customer Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Two-digit GST state code (place of supply)
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub associate_partner_id: Option<i64>,
    /// Receivable carried over from before the books started (positive = owed to us)
    pub opening_balance: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub associate_partner_id: Option<i64>,
    #[serde(default)]
    pub opening_balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub associate_partner_id: Option<i64>,
    pub opening_balance: Option<f64>,
}
