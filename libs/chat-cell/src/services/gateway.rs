use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_utils::phone::to_international;

/// Outbound message seam. The flow engine only ever sends plain text, so
/// that is the whole surface.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;
}

/// WhatsApp Cloud API client (Graph `/{version}/{phone_number_id}/messages`).
pub struct WhatsAppGateway {
    client: Client,
    messages_url: String,
    api_token: String,
}

impl WhatsAppGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            messages_url: config.whatsapp_messages_url(),
            api_token: config.whatsapp_api_token.clone(),
        }
    }

    /// Test constructor pointing at an arbitrary messages endpoint.
    pub fn with_messages_url(messages_url: &str, api_token: &str) -> Self {
        Self {
            client: Client::new(),
            messages_url: messages_url.to_string(),
            api_token: api_token.to_string(),
        }
    }
}

#[async_trait]
impl MessageSender for WhatsAppGateway {
    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        let to = to_international(to);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("WhatsApp API error ({}): {}", status, error_text));
        }

        debug!("Message sent to {}", to);
        Ok(())
    }
}
