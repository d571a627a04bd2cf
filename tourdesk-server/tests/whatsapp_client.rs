// WhatsApp Cloud API client against a mock Graph endpoint

use httpmock::prelude::*;
use serde_json::json;
use tourdesk_server::whatsapp::{WhatsAppClient, WhatsAppError};

const MESSAGES_PATH: &str = "/v21.0/1055/messages";

fn client(server: &MockServer) -> WhatsAppClient {
    WhatsAppClient::new(&server.base_url(), "v21.0", "1055", "test-token")
}

#[tokio::test]
async fn test_send_text_returns_message_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(MESSAGES_PATH)
                .header("authorization", "Bearer test-token")
                .json_body_partial(
                    r#"{"to":"919847012345","type":"text","text":{"body":"Your quotation is ready"}}"#,
                );
            then.status(200).json_body(json!({
                "messaging_product": "whatsapp",
                "contacts": [{ "input": "919847012345", "wa_id": "919847012345" }],
                "messages": [{ "id": "wamid.OUT1" }]
            }));
        })
        .await;

    let id = client(&server)
        .send_text("+91 98470-12345", "Your quotation is ready")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "wamid.OUT1");
}

#[tokio::test]
async fn test_send_template_with_parameters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(MESSAGES_PATH).json_body_partial(
                r#"{"type":"template","template":{"name":"quote_ready","language":{"code":"en"}}}"#,
            );
            then.status(200)
                .json_body(json!({ "messages": [{ "id": "wamid.TPL1" }] }));
        })
        .await;

    let id = client(&server)
        .send_template(
            "9847012345",
            "quote_ready",
            "en",
            &["Anita".to_string(), "TPQ-2025-000042".to_string()],
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id, "wamid.TPL1");
}

#[tokio::test]
async fn test_session_expired_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(MESSAGES_PATH);
            then.status(400).json_body(json!({
                "error": {
                    "message": "Re-engagement message",
                    "type": "OAuthException",
                    "code": 131047
                }
            }));
        })
        .await;

    let err = client(&server)
        .send_text("919847012345", "Hello")
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    match err {
        WhatsAppError::Api { status, code, .. } => {
            assert_eq!(status, 400);
            assert_eq!(code, Some(131047));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_phone_never_reaches_provider() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(MESSAGES_PATH);
            then.status(200);
        })
        .await;

    let err = client(&server).send_text("12345", "Hello").await.unwrap_err();

    assert!(matches!(err, WhatsAppError::InvalidPhone(_)));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_mark_read() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(MESSAGES_PATH)
                .json_body_partial(r#"{"status":"read","message_id":"wamid.IN1"}"#);
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    client(&server).mark_read("wamid.IN1").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_message_id_is_unexpected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(MESSAGES_PATH);
            then.status(200).json_body(json!({ "messaging_product": "whatsapp" }));
        })
        .await;

    let err = client(&server)
        .send_text("919847012345", "Hello")
        .await
        .unwrap_err();
    assert!(matches!(err, WhatsAppError::UnexpectedResponse(_)));
}
