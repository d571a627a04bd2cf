//! WhatsApp message log and campaigns

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CampaignCreate, CampaignDetail, CampaignRecipient, CampaignStatus, MessageDirection, WhatsAppCampaign,
    WhatsAppMessage,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::ServiceResult;
use crate::whatsapp::webhook::{InboundMessage, StatusUpdate};
use crate::whatsapp::{CampaignStore, SESSION_WINDOW_HOURS, normalize_phone};

const MESSAGE_COLUMNS: &str = "id, wa_message_id, direction, phone, message_type, body, template_name, status, \
                               error, campaign_id, sent_by, created_at, updated_at";
const CAMPAIGN_COLUMNS: &str = "id, name, template_name, language, parameters, status, total, sent, failed, \
                                created_by, created_at, completed_at";
const RECIPIENT_COLUMNS: &str = "id, campaign_id, phone, status, wa_message_id, error, sent_at";

/// Error stored for recipients whose number could not be normalized
pub const INVALID_PHONE_ERROR: &str = "invalid phone number";

// ── Messages ──

pub async fn list_messages(
    pool: &PgPool,
    phone: Option<&str>,
    limit: i64,
) -> Result<Vec<WhatsAppMessage>, BoxError> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS} FROM whatsapp_messages
        WHERE ($1::TEXT IS NULL OR phone = $1)
        ORDER BY created_at DESC
        LIMIT $2
        "#
    ))
    .bind(phone)
    .bind(limit.clamp(1, 500))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// An outbound message accepted by the provider
pub struct Outbound<'a> {
    pub wa_message_id: &'a str,
    pub phone: &'a str,
    pub message_type: &'a str,
    pub body: Option<&'a str>,
    pub template_name: Option<&'a str>,
    pub campaign_id: Option<i64>,
    pub sent_by: Option<i64>,
}

pub async fn insert_outbound(pool: &PgPool, msg: &Outbound<'_>) -> Result<WhatsAppMessage, BoxError> {
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO whatsapp_messages (id, wa_message_id, direction, phone, message_type, body, template_name,
                                       status, error, campaign_id, sent_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'sent', NULL, $8, $9, $10, $10)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(msg.wa_message_id)
    .bind(MessageDirection::Outbound.as_str())
    .bind(msg.phone)
    .bind(msg.message_type)
    .bind(msg.body)
    .bind(msg.template_name)
    .bind(msg.campaign_id)
    .bind(msg.sent_by)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Store an inbound message; redeliveries of the same id are ignored
pub async fn record_inbound(pool: &PgPool, msg: &InboundMessage) -> Result<bool, BoxError> {
    let now = now_millis();
    let phone = normalize_phone(&msg.from).unwrap_or_else(|_| msg.from.clone());
    let result = sqlx::query(
        r#"
        INSERT INTO whatsapp_messages (id, wa_message_id, direction, phone, message_type, body, template_name,
                                       status, error, campaign_id, sent_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NULL, 'received', NULL, NULL, NULL, $7, $8)
        ON CONFLICT (wa_message_id) DO NOTHING
        "#,
    )
    .bind(snowflake_id())
    .bind(&msg.id)
    .bind(MessageDirection::Inbound.as_str())
    .bind(phone)
    .bind(&msg.kind)
    .bind(msg.body())
    .bind(msg.timestamp_millis(now))
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delivery progress; a status never moves backwards
fn status_rank(status: &str) -> u8 {
    match status {
        "queued" => 0,
        "sent" => 1,
        "delivered" => 2,
        "read" => 3,
        "failed" => 4,
        _ => 0,
    }
}

/// `read` and `failed` are final; anything arriving after them is stale
fn is_terminal(status: &str) -> bool {
    matches!(status, "read" | "failed")
}

fn should_advance(current: &str, next: &str) -> bool {
    !is_terminal(current) && status_rank(next) > status_rank(current)
}

/// Apply a delivery status to the message and its campaign recipient
pub async fn apply_status(pool: &PgPool, update: &StatusUpdate) -> Result<bool, BoxError> {
    let mut tx = pool.begin().await?;
    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM whatsapp_messages WHERE wa_message_id = $1 FOR UPDATE")
            .bind(&update.id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(current) = current else {
        tracing::debug!(wa_message_id = %update.id, "Status for unknown message");
        return Ok(false);
    };
    if !should_advance(&current, &update.status) {
        return Ok(false);
    }

    let error = update.error_text();
    sqlx::query("UPDATE whatsapp_messages SET status = $1, error = $2, updated_at = $3 WHERE wa_message_id = $4")
        .bind(&update.status)
        .bind(&error)
        .bind(now_millis())
        .bind(&update.id)
        .execute(&mut *tx)
        .await?;

    if update.status == "failed" {
        sqlx::query("UPDATE campaign_recipients SET status = 'failed', error = $1 WHERE wa_message_id = $2")
            .bind(&error)
            .bind(&update.id)
            .execute(&mut *tx)
            .await?;
        // A completed campaign already has its counters; keep them in step
        sqlx::query(
            r#"
            UPDATE whatsapp_campaigns c SET
                sent = (SELECT COUNT(*) FROM campaign_recipients r WHERE r.campaign_id = c.id AND r.status = 'sent'),
                failed = (SELECT COUNT(*) FROM campaign_recipients r WHERE r.campaign_id = c.id AND r.status = 'failed')
            WHERE c.status = $1
              AND c.id = (SELECT campaign_id FROM campaign_recipients WHERE wa_message_id = $2)
            "#,
        )
        .bind(CampaignStatus::Completed.as_str())
        .bind(&update.id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(true)
}

/// Whether free-form text may be sent: the customer wrote within the window
pub async fn in_session(pool: &PgPool, phone: &str, now: i64) -> Result<bool, BoxError> {
    let since = now - SESSION_WINDOW_HOURS * 3600 * 1000;
    let open: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM whatsapp_messages
            WHERE phone = $1 AND direction = 'inbound' AND created_at >= $2
        )
        "#,
    )
    .bind(phone)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(open)
}

// ── Campaigns ──

/// Split raw numbers into normalized, de-duplicated valid ones and rejects
fn partition_recipients(raw: &[String]) -> (Vec<String>, Vec<String>) {
    let mut valid: Vec<String> = Vec::new();
    let mut invalid = Vec::new();
    for input in raw {
        match normalize_phone(input) {
            Ok(phone) if !valid.contains(&phone) => valid.push(phone),
            Ok(_) => {}
            Err(_) => invalid.push(input.trim().to_string()),
        }
    }
    (valid, invalid)
}

pub async fn list_campaigns(pool: &PgPool) -> Result<Vec<WhatsAppCampaign>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM whatsapp_campaigns ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_campaign(pool: &PgPool, id: i64) -> Result<Option<CampaignDetail>, BoxError> {
    let campaign: Option<WhatsAppCampaign> =
        sqlx::query_as(&format!("SELECT {CAMPAIGN_COLUMNS} FROM whatsapp_campaigns WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some(campaign) = campaign else {
        return Ok(None);
    };
    let recipients = sqlx::query_as(&format!(
        "SELECT {RECIPIENT_COLUMNS} FROM campaign_recipients WHERE campaign_id = $1 ORDER BY id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(Some(CampaignDetail { campaign, recipients }))
}

/// Create a pending campaign. Numbers that fail normalization are kept as
/// failed recipients so the operator sees them.
pub async fn create_campaign(
    pool: &PgPool,
    data: &CampaignCreate,
    created_by: Option<i64>,
) -> ServiceResult<CampaignDetail> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(AppError::required("name").into());
    }
    if data.template_name.trim().is_empty() {
        return Err(AppError::required("template_name").into());
    }
    let (valid, invalid) = partition_recipients(&data.recipients);
    if valid.is_empty() {
        return Err(AppError::new(ErrorCode::CampaignEmpty)
            .with_detail("invalid", invalid.len())
            .into());
    }

    let id = snowflake_id();
    let now = now_millis();
    let total = (valid.len() + invalid.len()) as i32;
    let mut tx = pool.begin().await?;
    let campaign: WhatsAppCampaign = sqlx::query_as(&format!(
        r#"
        INSERT INTO whatsapp_campaigns (id, name, template_name, language, parameters, status, total, sent,
                                        failed, created_by, created_at, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, $10, NULL)
        RETURNING {CAMPAIGN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(data.template_name.trim())
    .bind(data.language.trim())
    .bind(&data.parameters)
    .bind(CampaignStatus::Pending.as_str())
    .bind(total)
    .bind(invalid.len() as i32)
    .bind(created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut recipients = Vec::with_capacity(valid.len() + invalid.len());
    let rows = valid
        .iter()
        .map(|p| (p, "pending", None))
        .chain(invalid.iter().map(|p| (p, "failed", Some(INVALID_PHONE_ERROR))));
    for (phone, status, error) in rows {
        let recipient: CampaignRecipient = sqlx::query_as(&format!(
            r#"
            INSERT INTO campaign_recipients (id, campaign_id, phone, status, wa_message_id, error, sent_at)
            VALUES ($1, $2, $3, $4, NULL, $5, NULL)
            RETURNING {RECIPIENT_COLUMNS}
            "#
        ))
        .bind(snowflake_id())
        .bind(id)
        .bind(phone)
        .bind(status)
        .bind(error)
        .fetch_one(&mut *tx)
        .await?;
        recipients.push(recipient);
    }
    tx.commit().await?;

    tracing::info!(
        campaign_id = id,
        template = %campaign.template_name,
        recipients = valid.len(),
        rejected = invalid.len(),
        "Campaign created"
    );
    Ok(CampaignDetail { campaign, recipients })
}

/// Campaign progress persisted in Postgres
#[derive(Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
}

impl PgCampaignStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CampaignStore for PgCampaignStore {
    async fn mark_running(&self, campaign_id: i64) -> Result<(), BoxError> {
        sqlx::query("UPDATE whatsapp_campaigns SET status = $1 WHERE id = $2")
            .bind(CampaignStatus::Running.as_str())
            .bind(campaign_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_sent(
        &self,
        campaign: &WhatsAppCampaign,
        recipient: &CampaignRecipient,
        wa_message_id: &str,
    ) -> Result<(), BoxError> {
        sqlx::query("UPDATE campaign_recipients SET status = 'sent', wa_message_id = $1, sent_at = $2 WHERE id = $3")
            .bind(wa_message_id)
            .bind(now_millis())
            .bind(recipient.id)
            .execute(&self.pool)
            .await?;
        insert_outbound(
            &self.pool,
            &Outbound {
                wa_message_id,
                phone: &recipient.phone,
                message_type: "template",
                body: None,
                template_name: Some(&campaign.template_name),
                campaign_id: Some(campaign.id),
                sent_by: campaign.created_by,
            },
        )
        .await?;
        Ok(())
    }

    async fn record_failed(
        &self,
        _campaign: &WhatsAppCampaign,
        recipient: &CampaignRecipient,
        error: &str,
    ) -> Result<(), BoxError> {
        sqlx::query("UPDATE campaign_recipients SET status = 'failed', error = $1 WHERE id = $2")
            .bind(error)
            .bind(recipient.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete(&self, campaign_id: i64) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            UPDATE whatsapp_campaigns c SET
                status = $1,
                sent = (SELECT COUNT(*) FROM campaign_recipients r WHERE r.campaign_id = c.id AND r.status = 'sent'),
                failed = (SELECT COUNT(*) FROM campaign_recipients r WHERE r.campaign_id = c.id AND r.status = 'failed'),
                completed_at = $2
            WHERE c.id = $3
            "#,
        )
        .bind(CampaignStatus::Completed.as_str())
        .bind(now_millis())
        .bind(campaign_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_never_regresses() {
        assert!(should_advance("sent", "delivered"));
        assert!(should_advance("delivered", "read"));
        assert!(should_advance("sent", "failed"));
        assert!(should_advance("delivered", "failed"));
        assert!(!should_advance("read", "delivered"));
        assert!(!should_advance("delivered", "sent"));
        assert!(!should_advance("sent", "sent"));
        assert!(!should_advance("sent", "bogus"));
    }

    #[test]
    fn test_late_status_after_final_is_ignored() {
        // A late failure must not overwrite a message the customer read
        assert!(!should_advance("read", "failed"));
        assert!(!should_advance("failed", "read"));
        assert!(!should_advance("failed", "failed"));
    }

    #[test]
    fn test_partition_recipients() {
        let raw = vec![
            "+91 98470 12345".to_string(),
            "9847012345".to_string(),
            "12".to_string(),
            "0484-2345678x".to_string(),
            "+44 7911 123456".to_string(),
        ];
        let (valid, invalid) = partition_recipients(&raw);
        assert_eq!(valid, vec!["919847012345", "447911123456"]);
        assert_eq!(invalid, vec!["12", "0484-2345678x"]);
    }
}
