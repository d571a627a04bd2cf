// Router-level tests: identity, permissions, webhook handshake and signature.
// The pool is lazy and never connects; every request here is answered
// before a query would run.

use std::collections::HashMap;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use sqlx::postgres::PgPoolOptions;
use tourdesk_server::{AppState, Config, api};
use tower::ServiceExt;

const APP_SECRET: &str = "test-app-secret";
const VERIFY_TOKEN: &str = "test-verify-token";

fn app() -> Router {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgres://tourdesk@localhost/tourdesk_test"),
        ("WHATSAPP_APP_SECRET", APP_SECRET),
        ("WHATSAPP_VERIFY_TOKEN", VERIFY_TOKEN),
    ]);
    let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
    api::create_router(AppState::build(&config, pool, None))
}

fn staff(method: &str, uri: &str, role: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-staff-id", "1001")
        .header("x-staff-role", role)
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(APP_SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[tokio::test]
async fn test_health() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["whatsapp"], false);
    assert_eq!(body["pdf_cache_entries"], 0);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let resp = app()
        .oneshot(Request::get("/api/locations").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], 1001);
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let resp = app()
        .oneshot(staff("GET", "/api/locations", "intern").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], 1002);
}

#[tokio::test]
async fn test_viewer_cannot_read_accounting() {
    let resp = app()
        .oneshot(staff("GET", "/api/purchases", "viewer").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_operations_cannot_run_campaigns() {
    let resp = app()
        .oneshot(
            staff("POST", "/api/whatsapp/campaigns", "operations")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": "Diwali", "template_name": "diwali_offer", "recipients": ["9847012345"] })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_partner_cannot_reach_staff_resources() {
    let resp = app()
        .oneshot(
            Request::get("/api/suppliers")
                .header("x-partner-id", "77")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["code"], 2004);
}

#[tokio::test]
async fn test_send_without_whatsapp_configured() {
    let resp = app()
        .oneshot(
            staff("POST", "/api/whatsapp/send", "operations")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "phone": "9847012345", "body": "Hi" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_tds_preview() {
    let resp = app()
        .oneshot(
            staff("POST", "/api/tds/compute", "finance")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "section": "194C",
                        "deductee_kind": "individual",
                        "pan": "ABCDE1234F",
                        "amount": 40000.0
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["applicable"], true);
    assert_eq!(body["tds_amount"], 400.0);
    assert_eq!(body["net_payable"], 39600.0);
}

#[tokio::test]
async fn test_tds_summary_requires_valid_year() {
    let resp = app()
        .oneshot(staff("GET", "/api/reports/tds-summary", "finance").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app()
        .oneshot(
            staff("GET", "/api/reports/tds-summary?fy=2025", "finance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_subscription_handshake() {
    let uri = format!(
        "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444"
    );
    let resp = app()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"1158201444");

    let resp = app()
        .oneshot(
            Request::get("/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let body = r#"{"object":"whatsapp_business_account","entry":[]}"#;
    let resp = app()
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("x-hub-signature-256", "sha256=00ff")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app()
        .oneshot(Request::post("/webhooks/whatsapp").body(Body::from(body)).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_accepts_signed_delivery() {
    let body = r#"{"object":"whatsapp_business_account","entry":[{"changes":[{"field":"messages","value":{}}]}]}"#;
    let resp = app()
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("x-hub-signature-256", sign(body.as_bytes()))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
