//! WhatsApp Message / Campaign Models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Inbound => "inbound",
            MessageDirection::Outbound => "outbound",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WhatsAppMessage {
    pub id: i64,
    /// Provider message id (`wamid.…`)
    pub wa_message_id: Option<String>,
    pub direction: String,
    /// E.164 digits without `+`
    pub phone: String,
    /// text, template, image, ...
    pub message_type: String,
    pub body: Option<String>,
    pub template_name: Option<String>,
    /// queued, sent, delivered, read, failed, received
    pub status: String,
    pub error: Option<String>,
    pub campaign_id: Option<i64>,
    pub sent_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendText {
    pub phone: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTemplate {
    pub phone: String,
    pub template_name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

pub fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Running,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Running => "running",
            CampaignStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WhatsAppCampaign {
    pub id: i64,
    pub name: String,
    pub template_name: String,
    pub language: String,
    pub parameters: Vec<String>,
    pub status: String,
    pub total: i32,
    pub sent: i32,
    pub failed: i32,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CampaignRecipient {
    pub id: i64,
    pub campaign_id: i64,
    pub phone: String,
    /// pending, sent, failed
    pub status: String,
    pub wa_message_id: Option<String>,
    pub error: Option<String>,
    pub sent_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: WhatsAppCampaign,
    pub recipients: Vec<CampaignRecipient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreate {
    pub name: String,
    pub template_name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub recipients: Vec<String>,
}
