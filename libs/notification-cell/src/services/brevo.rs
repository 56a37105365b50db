use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::services::templates;

/// Email seam. Callers treat delivery as best-effort: a failed send is
/// logged by the caller and never rolls anything back.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(
        &self,
        to: &str,
        patient_name: &str,
        appointment_kind: &str,
        doctor: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<()>;
}

/// Brevo transactional email over the HTTP API. The SMTP ports are blocked
/// on the hosting platform, so everything goes through `/v3/smtp/email`.
pub struct BrevoMailer {
    client: Client,
    api_base_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl BrevoMailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_base_url: "https://api.brevo.com".to_string(),
            api_key: config.brevo_api_key.clone(),
            sender_email: config.brevo_sender_email.clone(),
            sender_name: config.brevo_sender_name.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.api_base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.sender_email.is_empty()
    }

    async fn send_html(&self, to: &str, to_name: &str, subject: &str, html: &str) -> Result<()> {
        let body = json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": [{ "email": to, "name": to_name }],
            "subject": subject,
            "htmlContent": html,
        });

        let response = self
            .client
            .post(format!("{}/v3/smtp/email", self.api_base_url))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Brevo API error ({}): {}", status, error_text));
        }

        info!("Email sent to {}: {}", to, subject);
        Ok(())
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send_confirmation(
        &self,
        to: &str,
        patient_name: &str,
        appointment_kind: &str,
        doctor: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<()> {
        if !self.is_configured() {
            warn!("Email not configured, skipping confirmation to {}", to);
            return Ok(());
        }
        if to.is_empty() {
            warn!("Empty email address, skipping confirmation");
            return Ok(());
        }

        let html =
            templates::confirmation_html(patient_name, appointment_kind, doctor, scheduled_at);
        self.send_html(to, patient_name, "Confirmación de Cita Médica", &html)
            .await
    }
}
