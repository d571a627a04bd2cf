//! Activity Model (sightseeing, excursions, add-ons)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Activity {
    pub id: i64,
    pub location_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Free text, e.g. "3 hours", "Half day"
    pub duration: Option<String>,
    /// Default selling price per person
    pub default_price: f64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreate {
    pub location_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub default_price: f64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityUpdate {
    pub location_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub default_price: Option<f64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}
