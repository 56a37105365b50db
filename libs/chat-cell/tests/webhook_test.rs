mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use chat_cell::handlers::ChatState;
use chat_cell::router::chat_routes;
use chat_cell::services::flow::FlowEngine;
use chat_cell::services::orchestrator::WebhookOrchestrator;
use chat_cell::services::sessions::{DedupGuard, SessionStore};
use shared_config::AppConfig;

use common::{roster, MemoryStore, NullMailer, RecordingSender};

fn test_config() -> AppConfig {
    AppConfig {
        supabase_url: String::new(),
        supabase_anon_key: String::new(),
        whatsapp_api_token: String::new(),
        whatsapp_phone_number_id: String::new(),
        whatsapp_base_url: String::new(),
        whatsapp_api_version: String::new(),
        whatsapp_verify_token: "secreto".to_string(),
        brevo_api_key: String::new(),
        brevo_sender_email: String::new(),
        brevo_sender_name: String::new(),
        conversation_timeout_minutes: 5,
    }
}

fn app() -> (axum::Router, Arc<RecordingSender>) {
    let store = Arc::new(MemoryStore::new(roster()));
    let sender = Arc::new(RecordingSender::new());
    let engine = Arc::new(FlowEngine::new(
        Arc::new(SessionStore::new()),
        store,
        sender.clone(),
        Arc::new(NullMailer::default()),
        5,
    ));
    let orchestrator =
        WebhookOrchestrator::new(&test_config(), Arc::new(DedupGuard::default()), engine);
    let state = Arc::new(ChatState {
        orchestrator,
        sender: sender.clone(),
    });
    (chat_routes(state), sender)
}

fn text_message_payload(id: &str, body: &str) -> String {
    json!({
        "entry": [{
            "changes": [{
                "value": {
                    "messages": [{
                        "id": id,
                        "from": "573001234567",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
    .to_string()
}

#[tokio::test]
async fn verification_echoes_the_challenge() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::get("/webhook?hub.mode=subscribe&hub.verify_token=secreto&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"12345");
}

#[tokio::test]
async fn verification_rejects_a_wrong_token() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::get("/webhook?hub.mode=subscribe&hub.verify_token=otro&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn text_messages_get_a_reply() {
    let (app, sender) = app();

    let response = app
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(text_message_payload("wamid.1", "Hola")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sender.count(), 1);
    assert!(sender.last().contains("Bienvenido"));
}

#[tokio::test]
async fn redelivered_messages_are_handled_once() {
    let (app, sender) = app();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(text_message_payload("wamid.dup", "Hola")))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(sender.count(), 1);
}

#[tokio::test]
async fn status_webhooks_are_acknowledged_silently() {
    let (app, sender) = app();

    let payload = json!({
        "entry": [{
            "changes": [{
                "value": { "statuses": [{ "id": "wamid.1", "status": "read" }] }
            }]
        }]
    })
    .to_string();

    let response = app
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sender.count(), 0);
}

#[tokio::test]
async fn malformed_payloads_are_acknowledged_silently() {
    let (app, sender) = app();

    let response = app
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from("not json at all"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sender.count(), 0);
}

#[tokio::test]
async fn stats_counts_live_sessions() {
    let (app, _) = app();

    app.clone()
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(text_message_payload("wamid.1", "1")))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["active_sessions"], 1);
    assert_eq!(stats["dedup_entries"], 1);
}
