//! Inquiry Model (customer lead)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lead pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    Contacted,
    Quoted,
    Confirmed,
    Cancelled,
    Lost,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Quoted => "quoted",
            InquiryStatus::Confirmed => "confirmed",
            InquiryStatus::Cancelled => "cancelled",
            InquiryStatus::Lost => "lost",
        }
    }

    /// Closed inquiries accept no further changes
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            InquiryStatus::Confirmed | InquiryStatus::Cancelled | InquiryStatus::Lost
        )
    }

    /// Open inquiries may move to any other status; closed ones stay put
    pub fn can_transition_to(&self, next: InquiryStatus) -> bool {
        !self.is_closed() && *self != next
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "quoted" => Ok(InquiryStatus::Quoted),
            "confirmed" => Ok(InquiryStatus::Confirmed),
            "cancelled" => Ok(InquiryStatus::Cancelled),
            "lost" => Ok(InquiryStatus::Lost),
            other => Err(format!("unknown inquiry status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Inquiry {
    pub id: i64,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    /// YYYY-MM-DD
    pub travel_date: Option<String>,
    pub adults: i32,
    pub children: i32,
    pub budget: Option<f64>,
    /// website, walk-in, partner, whatsapp...
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub associate_partner_id: Option<i64>,
    pub assigned_staff_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Inquiry {
    pub fn status(&self) -> Option<InquiryStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryCreate {
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    pub travel_date: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    pub budget: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub associate_partner_id: Option<i64>,
}

fn default_adults() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquiryUpdate {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location_id: Option<i64>,
    pub travel_date: Option<String>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub budget: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryAssign {
    pub staff_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryStatusChange {
    pub status: InquiryStatus,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(InquiryStatus::New.can_transition_to(InquiryStatus::Contacted));
        assert!(InquiryStatus::Quoted.can_transition_to(InquiryStatus::Lost));
        assert!(!InquiryStatus::New.can_transition_to(InquiryStatus::New));
        assert!(!InquiryStatus::Confirmed.can_transition_to(InquiryStatus::Cancelled));
        assert!(!InquiryStatus::Lost.can_transition_to(InquiryStatus::New));
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["new", "contacted", "quoted", "confirmed", "cancelled", "lost"] {
            let status: InquiryStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("open".parse::<InquiryStatus>().is_err());
    }
}
