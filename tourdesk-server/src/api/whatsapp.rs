//! WhatsApp messaging, campaigns and the provider webhook

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CampaignCreate, CampaignDetail, SendTemplate, SendText, WhatsAppCampaign, WhatsAppMessage};
use shared::roles::Permission;
use shared::util::now_millis;

use super::{ApiResult, found, internal};
use crate::auth::Actor;
use crate::db::whatsapp::{self as store, Outbound, PgCampaignStore};
use crate::state::AppState;
use crate::whatsapp::webhook::{self, SIGNATURE_HEADER, WebhookEvent, WebhookPayload};
use crate::whatsapp::{CampaignRunner, WhatsAppClient, normalize_phone};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/whatsapp/send", post(send_text))
        .route("/api/whatsapp/send-template", post(send_template))
        .route("/api/whatsapp/messages", get(list_messages))
        .route("/api/whatsapp/campaigns", get(list_campaigns).post(create_campaign))
        .route("/api/whatsapp/campaigns/{id}", get(get_campaign))
}

fn client(state: &AppState) -> Result<&WhatsAppClient, AppError> {
    state
        .whatsapp
        .as_ref()
        .ok_or_else(|| AppError::new(ErrorCode::WhatsAppNotConfigured))
}

/// POST /api/whatsapp/send - free-form text inside the 24-hour window
pub async fn send_text(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<SendText>,
) -> Result<(StatusCode, Json<WhatsAppMessage>), AppError> {
    actor.require(Permission::WhatsAppSend)?;
    let client = client(&state)?;
    if data.body.trim().is_empty() {
        return Err(AppError::required("body"));
    }
    let phone = normalize_phone(&data.phone)?;

    // Checked locally so the provider is not hit for a message it will reject
    if !store::in_session(&state.pool, &phone, now_millis())
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::WhatsAppSessionExpired).with_detail("phone", phone));
    }

    let wa_message_id = client.send_text(&phone, &data.body).await?;
    let message = store::insert_outbound(
        &state.pool,
        &Outbound {
            wa_message_id: &wa_message_id,
            phone: &phone,
            message_type: "text",
            body: Some(&data.body),
            template_name: None,
            campaign_id: None,
            sent_by: actor.staff_id(),
        },
    )
    .await
    .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/whatsapp/send-template - allowed outside the session window
pub async fn send_template(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<SendTemplate>,
) -> Result<(StatusCode, Json<WhatsAppMessage>), AppError> {
    actor.require(Permission::WhatsAppSend)?;
    let client = client(&state)?;
    if data.template_name.trim().is_empty() {
        return Err(AppError::required("template_name"));
    }
    let phone = normalize_phone(&data.phone)?;
    let wa_message_id = client
        .send_template(&phone, data.template_name.trim(), &data.language, &data.parameters)
        .await?;
    let message = store::insert_outbound(
        &state.pool,
        &Outbound {
            wa_message_id: &wa_message_id,
            phone: &phone,
            message_type: "template",
            body: None,
            template_name: Some(data.template_name.trim()),
            campaign_id: None,
            sent_by: actor.staff_id(),
        },
    )
    .await
    .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub phone: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub async fn list_messages(
    State(state): State<AppState>,
    actor: Actor,
    Query(q): Query<MessageQuery>,
) -> ApiResult<Vec<WhatsAppMessage>> {
    actor.require(Permission::WhatsAppSend)?;
    let phone = q.phone.as_deref().map(normalize_phone).transpose()?;
    let rows = store::list_messages(&state.pool, phone.as_deref(), q.limit)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

// ── Campaigns ──

pub async fn list_campaigns(
    State(state): State<AppState>,
    actor: Actor,
) -> ApiResult<Vec<WhatsAppCampaign>> {
    actor.require(Permission::WhatsAppCampaign)?;
    let rows = store::list_campaigns(&state.pool).await.map_err(internal)?;
    Ok(Json(rows))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<CampaignDetail> {
    actor.require(Permission::WhatsAppCampaign)?;
    let row = store::get_campaign(&state.pool, id).await.map_err(internal)?;
    Ok(Json(found(row, ErrorCode::CampaignNotFound, id)?))
}

/// POST /api/whatsapp/campaigns - stores the campaign and starts sending in
/// the background; progress is read back through `GET /campaigns/{id}`
pub async fn create_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Json(data): Json<CampaignCreate>,
) -> Result<(StatusCode, Json<CampaignDetail>), AppError> {
    actor.require(Permission::WhatsAppCampaign)?;
    let client = client(&state)?.clone();
    let detail = store::create_campaign(&state.pool, &data, actor.staff_id()).await?;

    let campaign = detail.campaign.clone();
    let recipients = detail.recipients.clone();
    let campaign_store = PgCampaignStore::new(state.pool.clone());
    let runner = CampaignRunner::new(client, state.whatsapp_send_delay);
    tokio::spawn(async move {
        if let Err(e) = runner.run(&campaign_store, &campaign, &recipients).await {
            tracing::error!(campaign_id = campaign.id, error = %e, "Campaign aborted");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(detail)))
}

// ── Webhook ──

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhooks/whatsapp - subscription handshake
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(q): Query<SubscriptionQuery>,
) -> Response {
    if state.whatsapp_verify_token.is_empty() {
        return StatusCode::FORBIDDEN.into_response();
    }
    match webhook::verify_subscription(
        q.mode.as_deref(),
        q.verify_token.as_deref(),
        q.challenge.as_deref(),
        &state.whatsapp_verify_token,
    ) {
        Some(challenge) => {
            tracing::info!("WhatsApp webhook subscription verified");
            challenge.to_string().into_response()
        }
        None => {
            tracing::warn!(mode = ?q.mode, "WhatsApp webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhooks/whatsapp - inbound messages and delivery statuses
///
/// Anything that passes the signature check is acknowledged with 200 so
/// the provider does not redeliver; processing failures are only logged.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::WebhookSignatureInvalid))?;
    if state.whatsapp_app_secret.is_empty() {
        return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
    }
    webhook::verify_signature(&body, signature, &state.whatsapp_app_secret).map_err(|e| {
        tracing::warn!(reason = e, "WhatsApp webhook signature rejected");
        AppError::new(ErrorCode::WebhookSignatureInvalid)
    })?;

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable WhatsApp webhook payload");
            return Ok(StatusCode::OK);
        }
    };

    for event in payload.into_events() {
        match event {
            WebhookEvent::Inbound(message) => {
                match store::record_inbound(&state.pool, &message).await {
                    Ok(true) => {
                        tracing::info!(from = %message.from, kind = %message.kind, "WhatsApp message received");
                        if let Some(client) = state.whatsapp.clone() {
                            let id = message.id.clone();
                            tokio::spawn(async move {
                                if let Err(e) = client.mark_read(&id).await {
                                    tracing::debug!(error = %e, "Failed to mark message read");
                                }
                            });
                        }
                    }
                    Ok(false) => tracing::debug!(id = %message.id, "Duplicate inbound message ignored"),
                    Err(e) => tracing::error!(id = %message.id, error = %e, "Failed to store inbound message"),
                }
            }
            WebhookEvent::Status(update) => {
                if let Err(e) = store::apply_status(&state.pool, &update).await {
                    tracing::error!(id = %update.id, error = %e, "Failed to apply message status");
                }
            }
        }
    }
    Ok(StatusCode::OK)
}
