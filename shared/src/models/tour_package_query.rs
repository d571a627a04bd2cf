//! Tour Package Query Model (customer-specific quotation)

use serde::{Deserialize, Serialize};

use super::itinerary::{DayPlan, DayPlanInput};
use crate::pricing::{PriceBreakdown, QuotePricing};

/// Quotation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Draft,
    Priced,
    Confirmed,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Draft => "draft",
            QueryStatus::Priced => "priced",
            QueryStatus::Confirmed => "confirmed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TourPackageQuery {
    pub id: i64,
    /// Human-facing number, e.g. "TPQ-2025-000123"
    pub query_number: String,
    pub inquiry_id: Option<i64>,
    pub tour_package_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub associate_partner_id: Option<i64>,
    pub title: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    /// YYYY-MM-DD
    pub travel_date: Option<String>,
    pub adults: i32,
    pub children_with_bed: i32,
    pub children_without_bed: i32,
    pub infants: i32,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub terms: Option<String>,
    /// [`QuotePricing`] JSON
    pub pricing: Option<serde_json::Value>,
    /// [`PriceBreakdown`] JSON, present once priced
    pub breakdown: Option<serde_json::Value>,
    pub grand_total: Option<f64>,
    pub status: String,
    pub created_by: Option<i64>,
    pub confirmed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TourPackageQuery {
    pub fn pricing_input(&self) -> Option<QuotePricing> {
        self.pricing
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn price_breakdown(&self) -> Option<PriceBreakdown> {
        self.breakdown
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == QueryStatus::Confirmed.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageQueryDetail {
    #[serde(flatten)]
    pub query: TourPackageQuery,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackageQueryCreate {
    pub title: Option<String>,
    pub inquiry_id: Option<i64>,
    /// Copy days, inclusions and exclusions from this package
    pub tour_package_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub associate_partner_id: Option<i64>,
    pub customer_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    pub travel_date: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: i32,
    #[serde(default)]
    pub children_with_bed: i32,
    #[serde(default)]
    pub children_without_bed: i32,
    #[serde(default)]
    pub infants: i32,
    pub inclusions: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
    pub terms: Option<String>,
    pub days: Option<Vec<DayPlanInput>>,
    pub pricing: Option<QuotePricing>,
}

fn default_adults() -> i32 {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TourPackageQueryUpdate {
    pub title: Option<String>,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    pub travel_date: Option<String>,
    pub adults: Option<i32>,
    pub children_with_bed: Option<i32>,
    pub children_without_bed: Option<i32>,
    pub infants: Option<i32>,
    pub inclusions: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
    pub terms: Option<String>,
    pub days: Option<Vec<DayPlanInput>>,
    /// Changing pricing drops the query back to draft
    pub pricing: Option<QuotePricing>,
}

/// `TPQ-{year}-{sequence:06}`
pub fn query_number(year: i32, sequence: i64) -> String {
    format!("TPQ-{year}-{sequence:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_number() {
        assert_eq!(query_number(2025, 42), "TPQ-2025-000042");
        assert_eq!(query_number(2026, 1_234_567), "TPQ-2026-1234567");
    }
}
