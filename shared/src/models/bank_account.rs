//! Bank Account Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BankAccount {
    pub id: i64,
    pub account_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub ifsc: Option<String>,
    pub branch: Option<String>,
    pub opening_balance: f64,
    /// Recomputed from ledger history on every movement
    pub current_balance: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccountCreate {
    pub account_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub ifsc: Option<String>,
    pub branch: Option<String>,
    #[serde(default)]
    pub opening_balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankAccountUpdate {
    pub account_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc: Option<String>,
    pub branch: Option<String>,
    /// Changing the opening balance triggers a recalculation
    pub opening_balance: Option<f64>,
    pub is_active: Option<bool>,
}
