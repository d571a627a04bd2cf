//! Tour Package Model (sellable itinerary template)

use serde::{Deserialize, Serialize};

use super::itinerary::{DayPlan, DayPlanInput};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TourPackage {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub location_id: i64,
    /// Itinerary the days were copied from
    pub itinerary_id: Option<i64>,
    pub duration_days: i32,
    pub duration_nights: i32,
    /// "Starting from" price per adult
    pub price_from: f64,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub is_published: bool,
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageDetail {
    #[serde(flatten)]
    pub package: TourPackage,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageCreate {
    pub name: String,
    pub slug: Option<String>,
    pub location_id: i64,
    /// Copy days from this itinerary when `days` is empty
    pub itinerary_id: Option<i64>,
    #[serde(default)]
    pub price_from: f64,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub days: Vec<DayPlanInput>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TourPackageUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub location_id: Option<i64>,
    pub price_from: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub inclusions: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
    /// Replaces all days when present
    pub days: Option<Vec<DayPlanInput>>,
    pub is_published: Option<bool>,
    pub is_archived: Option<bool>,
}

/// Public listing item (website / mobile)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PublicTourPackage {
    pub name: String,
    pub slug: String,
    pub location_name: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub price_from: f64,
    pub summary: Option<String>,
    pub image_url: Option<String>,
}

/// Nights = days - 1 (a zero-day package has zero nights)
pub fn nights_for(days: usize) -> i32 {
    (days as i32 - 1).max(0)
}
