//! Webhook signature verification and payload parsing
//!
//! Payload shape: `entry[].changes[].value.{messages[], statuses[]}`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify `X-Hub-Signature-256: sha256=<hex>` over the raw body
pub fn verify_signature(payload: &[u8], header: &str, app_secret: &str) -> Result<(), &'static str> {
    let signature = header
        .trim()
        .strip_prefix("sha256=")
        .ok_or("Invalid signature header")?;

    let mut mac = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(payload);

    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")
}

/// Subscription handshake: echo `hub.challenge` when mode and token match
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
    verify_token: &str,
) -> Option<&'a str> {
    match (mode, token, challenge) {
        (Some("subscribe"), Some(t), Some(c)) if t == verify_token => Some(c),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub statuses: Vec<StatusUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    /// Unix seconds as a string
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<TextBody>,
    pub button: Option<ButtonReply>,
    pub interactive: Option<serde_json::Value>,
    pub image: Option<MediaBody>,
    pub document: Option<MediaBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ButtonReply {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaBody {
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// Provider message id the status refers to
    pub id: String,
    /// sent | delivered | read | failed
    pub status: String,
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}

#[derive(Debug, Deserialize)]
pub struct StatusError {
    pub code: Option<i64>,
    pub title: Option<String>,
    pub message: Option<String>,
}

impl InboundMessage {
    /// Human-readable body, when the message type carries one
    pub fn body(&self) -> Option<String> {
        match self.kind.as_str() {
            "text" => self.text.as_ref().map(|t| t.body.clone()),
            "button" => self.button.as_ref().map(|b| b.text.clone()),
            "interactive" => self.interactive.as_ref().and_then(|i| {
                let reply = i.get("button_reply").or_else(|| i.get("list_reply"))?;
                reply.get("title")?.as_str().map(String::from)
            }),
            "image" => self.image.as_ref().and_then(|m| m.caption.clone()),
            "document" => self.document.as_ref().and_then(|m| m.caption.clone()),
            _ => None,
        }
    }

    /// Provider timestamp in millis, falling back to `now`
    pub fn timestamp_millis(&self, now: i64) -> i64 {
        self.timestamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .unwrap_or(now)
    }
}

impl StatusUpdate {
    pub fn error_text(&self) -> Option<String> {
        let e = self.errors.first()?;
        let text = e.message.clone().or_else(|| e.title.clone()).unwrap_or_default();
        Some(match e.code {
            Some(code) => format!("{code}: {text}"),
            None => text,
        })
    }
}

/// Everything a delivery carries, flattened
#[derive(Debug)]
pub enum WebhookEvent {
    Inbound(InboundMessage),
    Status(StatusUpdate),
}

impl WebhookPayload {
    pub fn into_events(self) -> Vec<WebhookEvent> {
        let mut events = Vec::new();
        for change in self.entry.into_iter().flat_map(|e| e.changes) {
            events.extend(change.value.messages.into_iter().map(WebhookEvent::Inbound));
            events.extend(change.value.statuses.into_iter().map(WebhookEvent::Status));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature() {
        let body = br#"{"object":"whatsapp_business_account"}"#;
        let header = sign(body, "app-secret");
        assert!(verify_signature(body, &header, "app-secret").is_ok());
        assert_eq!(
            verify_signature(body, &header, "other-secret"),
            Err("Webhook signature mismatch")
        );
        assert_eq!(
            verify_signature(b"tampered", &header, "app-secret"),
            Err("Webhook signature mismatch")
        );
        assert!(verify_signature(body, "md5=abc", "app-secret").is_err());
        assert!(verify_signature(body, "sha256=zz", "app-secret").is_err());
    }

    #[test]
    fn test_verify_subscription() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("tok"), Some("1158201444"), "tok"),
            Some("1158201444")
        );
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("bad"), Some("1158201444"), "tok"),
            None
        );
        assert_eq!(verify_subscription(None, Some("tok"), Some("1"), "tok"), None);
    }

    #[test]
    fn test_parse_messages_and_statuses() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": { "phone_number_id": "1055" },
                        "contacts": [{ "profile": { "name": "Anita" }, "wa_id": "919847012345" }],
                        "messages": [{
                            "from": "919847012345",
                            "id": "wamid.IN1",
                            "timestamp": "1717000000",
                            "type": "text",
                            "text": { "body": "Is the Munnar package available in May?" }
                        }, {
                            "from": "919847012345",
                            "id": "wamid.IN2",
                            "timestamp": "1717000005",
                            "type": "interactive",
                            "interactive": { "type": "button_reply", "button_reply": { "id": "yes", "title": "Yes, book it" } }
                        }],
                        "statuses": [{
                            "id": "wamid.OUT1",
                            "status": "failed",
                            "timestamp": "1717000010",
                            "recipient_id": "919847012345",
                            "errors": [{ "code": 131026, "title": "Message undeliverable" }]
                        }]
                    }
                }]
            }]
        }))
        .unwrap();

        let events = payload.into_events();
        assert_eq!(events.len(), 3);
        match &events[0] {
            WebhookEvent::Inbound(m) => {
                assert_eq!(m.id, "wamid.IN1");
                assert_eq!(m.body().as_deref(), Some("Is the Munnar package available in May?"));
                assert_eq!(m.timestamp_millis(0), 1_717_000_000_000);
            }
            other => panic!("unexpected event {other:?}"),
        }
        match &events[1] {
            WebhookEvent::Inbound(m) => assert_eq!(m.body().as_deref(), Some("Yes, book it")),
            other => panic!("unexpected event {other:?}"),
        }
        match &events[2] {
            WebhookEvent::Status(s) => {
                assert_eq!(s.status, "failed");
                assert_eq!(s.error_text().as_deref(), Some("131026: Message undeliverable"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_millis_falls_back_to_now() {
        let message = |timestamp: &str| InboundMessage {
            id: "wamid.IN9".into(),
            from: "919847012345".into(),
            timestamp: timestamp.into(),
            kind: "text".into(),
            text: None,
            button: None,
            interactive: None,
            image: None,
            document: None,
        };
        assert_eq!(message("1717000000").timestamp_millis(5), 1_717_000_000_000);
        assert_eq!(message("").timestamp_millis(5), 5);
        assert_eq!(message("9223372036854775807").timestamp_millis(5), 5);
    }

    #[test]
    fn test_parse_empty_change() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{"object":"whatsapp_business_account","entry":[{"changes":[{"field":"messages","value":{}}]}]}"#,
        )
        .unwrap();
        assert!(payload.into_events().is_empty());
    }
}
