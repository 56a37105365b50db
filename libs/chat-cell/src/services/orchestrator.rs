use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{ChatStats, InboundMessage};
use crate::services::flow::FlowEngine;
use crate::services::sessions::DedupGuard;

/// Sits between the webhook handlers and the flow engine: verifies the
/// Meta handshake, extracts the text message from the webhook envelope and
/// drops redelivered duplicates.
pub struct WebhookOrchestrator {
    verify_token: String,
    dedup: Arc<DedupGuard>,
    engine: Arc<FlowEngine>,
}

impl WebhookOrchestrator {
    pub fn new(config: &AppConfig, dedup: Arc<DedupGuard>, engine: Arc<FlowEngine>) -> Self {
        Self {
            verify_token: config.whatsapp_verify_token.clone(),
            dedup,
            engine,
        }
    }

    pub fn verify_token_matches(&self, token: &str) -> bool {
        !self.verify_token.is_empty() && token == self.verify_token
    }

    /// Handles one webhook delivery. Envelopes without a text message
    /// (statuses, media, malformed payloads) are ignored without a reply.
    pub async fn process_webhook(&self, payload: &str) -> Result<()> {
        let root: Value = match serde_json::from_str(payload) {
            Ok(root) => root,
            Err(e) => {
                warn!("Malformed webhook payload ignored: {}", e);
                return Ok(());
            }
        };

        let Some(message) = parse_inbound(&root) else {
            debug!("Webhook without a text message, ignored");
            return Ok(());
        };

        if !self.dedup.should_process(&message.id) {
            return Ok(());
        }
        self.dedup.sweep();

        info!("Inbound message {} from {}", message.id, message.from);
        self.engine.handle_message(&message.from, &message.text).await
    }

    pub async fn stats(&self) -> ChatStats {
        ChatStats {
            active_sessions: self.engine.sessions().len().await,
            dedup_entries: self.dedup.len(),
        }
    }
}

/// Digs `entry[0].changes[0].value.messages[0]` out of the webhook
/// envelope. Only text messages are acted on.
pub fn parse_inbound(root: &Value) -> Option<InboundMessage> {
    let message = root
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;

    let id = message.get("id")?.as_str()?.to_string();
    let from = message.get("from")?.as_str()?.to_string();
    let text = message.get("text")?.get("body")?.as_str()?.to_string();

    Some(InboundMessage { id, from, text })
}
