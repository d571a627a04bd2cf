//! WhatsApp Cloud API client (REST, no SDK dependency)

use serde_json::{Value, json};
use std::time::Duration;
use tracing::instrument;

use super::WhatsAppError;
use super::phone::normalize_phone;

#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    /// `{base}/{version}/{phone_number_id}/messages`
    messages_url: String,
    access_token: String,
}

impl std::fmt::Debug for WhatsAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppClient")
            .field("messages_url", &self.messages_url)
            .finish_non_exhaustive()
    }
}

impl WhatsAppClient {
    pub fn new(api_base: &str, api_version: &str, phone_number_id: &str, access_token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            messages_url: format!(
                "{}/{}/{}/messages",
                api_base.trim_end_matches('/'),
                api_version.trim_matches('/'),
                phone_number_id
            ),
            access_token: access_token.to_string(),
        }
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Free-form text; only delivered inside the 24-hour session window
    #[instrument(skip(self, body), fields(to = %to))]
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, WhatsAppError> {
        let to = normalize_phone(to)?;
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": body },
        });
        self.post_message(&payload).await
    }

    /// Pre-approved template with positional body parameters
    #[instrument(skip(self, parameters), fields(to = %to))]
    pub async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        parameters: &[String],
    ) -> Result<String, WhatsAppError> {
        let to = normalize_phone(to)?;
        let payload = template_payload(&to, template_name, language, parameters);
        self.post_message(&payload).await
    }

    /// Blue ticks for an inbound message
    #[instrument(skip(self))]
    pub async fn mark_read(&self, message_id: &str) -> Result<(), WhatsAppError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        });
        let resp = self.post(&payload).await?;
        if resp.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(WhatsAppError::UnexpectedResponse(resp.to_string()))
        }
    }

    /// Send and return the provider message id (`wamid.…`)
    async fn post_message(&self, payload: &Value) -> Result<String, WhatsAppError> {
        let resp = self.post(payload).await?;
        resp["messages"][0]["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| WhatsAppError::UnexpectedResponse(resp.to_string()))
    }

    async fn post(&self, payload: &Value) -> Result<Value, WhatsAppError> {
        let resp = self
            .http
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }

        let error = &body["error"];
        Err(WhatsAppError::Api {
            status: status.as_u16(),
            code: error["code"].as_i64(),
            message: error["message"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {status}")),
        })
    }
}

fn template_payload(to: &str, template_name: &str, language: &str, parameters: &[String]) -> Value {
    let mut template = json!({
        "name": template_name,
        "language": { "code": language },
    });
    if !parameters.is_empty() {
        let params: Vec<Value> = parameters
            .iter()
            .map(|p| json!({ "type": "text", "text": p }))
            .collect();
        template["components"] = json!([{ "type": "body", "parameters": params }]);
    }
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": template,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let client = WhatsAppClient::new("https://graph.facebook.com/", "v21.0", "1055", "t");
        assert_eq!(
            client.messages_url(),
            "https://graph.facebook.com/v21.0/1055/messages"
        );
    }

    #[test]
    fn test_template_payload() {
        let payload = template_payload(
            "919847012345",
            "quote_ready",
            "en",
            &["Anita".to_string(), "TPQ-2025-000042".to_string()],
        );
        assert_eq!(payload["type"], "template");
        assert_eq!(payload["template"]["language"]["code"], "en");
        let params = payload["template"]["components"][0]["parameters"]
            .as_array()
            .unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1]["text"], "TPQ-2025-000042");

        let bare = template_payload("919847012345", "hello_world", "en_US", &[]);
        assert!(bare["template"].get("components").is_none());
    }
}
