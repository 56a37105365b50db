use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use shared_models::AppError;

use crate::models::{ChatStats, SendMessageRequest, VerifyParams};
use crate::services::gateway::MessageSender;
use crate::services::orchestrator::WebhookOrchestrator;

/// Everything the chat endpoints need, wired once at startup.
pub struct ChatState {
    pub orchestrator: WebhookOrchestrator,
    pub sender: Arc<dyn MessageSender>,
}

/// Meta's verification handshake: echo the challenge back iff the mode is
/// `subscribe` and the token matches.
#[axum::debug_handler]
pub async fn verify_webhook(
    State(state): State<Arc<ChatState>>,
    Query(params): Query<VerifyParams>,
) -> Result<String, AppError> {
    let subscribe = params.mode.as_deref() == Some("subscribe");
    let token_ok = params
        .verify_token
        .as_deref()
        .is_some_and(|t| state.orchestrator.verify_token_matches(t));

    match (subscribe, token_ok, params.challenge) {
        (true, true, Some(challenge)) => {
            info!("Webhook verified");
            Ok(challenge)
        }
        _ => Err(AppError::Forbidden("verification failed".to_string())),
    }
}

/// Message deliveries. Always answers 200 so Meta stops redelivering;
/// processing failures are logged, never surfaced.
#[axum::debug_handler]
pub async fn receive_webhook(State(state): State<Arc<ChatState>>, body: String) -> StatusCode {
    if let Err(e) = state.orchestrator.process_webhook(&body).await {
        error!("Webhook processing failed: {:#}", e);
    }
    StatusCode::OK
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<Arc<ChatState>>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .sender
        .send_text(&request.to, &request.message)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!({
        "message": "Mensaje enviado correctamente"
    })))
}

#[axum::debug_handler]
pub async fn stats(State(state): State<Arc<ChatState>>) -> Json<ChatStats> {
    Json(state.orchestrator.stats().await)
}
