//! Itinerary Model
//!
//! Day plans are shared by itineraries, tour packages and tour package
//! queries; `owner_kind` + `owner_id` identify the parent.

use serde::{Deserialize, Serialize};

/// Parent of a [`DayPlan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOwner {
    Itinerary,
    TourPackage,
    Query,
}

impl DayOwner {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOwner::Itinerary => "itinerary",
            DayOwner::TourPackage => "tour_package",
            DayOwner::Query => "query",
        }
    }
}

/// One day of a travel plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DayPlan {
    pub id: i64,
    /// 1-based
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub hotel_id: Option<i64>,
    /// e.g. "Breakfast, Dinner"
    pub meals: Option<String>,
    pub activity_ids: Vec<i64>,
}

/// Day plan input (create/replace)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlanInput {
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub hotel_id: Option<i64>,
    pub meals: Option<String>,
    #[serde(default)]
    pub activity_ids: Vec<i64>,
}

impl From<&DayPlan> for DayPlanInput {
    fn from(day: &DayPlan) -> Self {
        Self {
            day_number: day.day_number,
            title: day.title.clone(),
            description: day.description.clone(),
            hotel_id: day.hotel_id,
            meals: day.meals.clone(),
            activity_ids: day.activity_ids.clone(),
        }
    }
}

/// Days must be numbered 1..=n without gaps or duplicates
pub fn validate_days(days: &[DayPlanInput]) -> Result<(), String> {
    let mut numbers: Vec<i32> = days.iter().map(|d| d.day_number).collect();
    numbers.sort_unstable();
    for (i, n) in numbers.iter().enumerate() {
        if *n != i as i32 + 1 {
            return Err(format!("day numbers must run 1..={} without gaps", days.len()));
        }
    }
    if let Some(day) = days.iter().find(|d| d.title.trim().is_empty()) {
        return Err(format!("day {} has no title", day.day_number));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Itinerary {
    pub id: i64,
    pub location_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub nights: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Itinerary with its day plans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryDetail {
    #[serde(flatten)]
    pub itinerary: Itinerary,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryCreate {
    pub location_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub days: Vec<DayPlanInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItineraryUpdate {
    pub location_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replaces all days when present
    pub days: Option<Vec<DayPlanInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i32) -> DayPlanInput {
        DayPlanInput {
            day_number: n,
            title: format!("Day {n}"),
            description: None,
            hotel_id: None,
            meals: None,
            activity_ids: vec![],
        }
    }

    #[test]
    fn test_validate_days() {
        assert!(validate_days(&[]).is_ok());
        assert!(validate_days(&[day(2), day(1), day(3)]).is_ok());
        assert!(validate_days(&[day(1), day(3)]).is_err());
        assert!(validate_days(&[day(1), day(1)]).is_err());
        assert!(validate_days(&[day(0)]).is_err());

        let mut untitled = day(1);
        untitled.title = "  ".to_string();
        assert!(validate_days(&[untitled]).is_err());
    }
}
