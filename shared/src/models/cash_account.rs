//! Cash Account Model (petty cash, branch cash)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashAccount {
    pub id: i64,
    pub name: String,
    pub opening_balance: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAccountCreate {
    pub name: String,
    #[serde(default)]
    pub opening_balance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashAccountUpdate {
    pub name: Option<String>,
    pub opening_balance: Option<f64>,
    pub is_active: Option<bool>,
}
