use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub whatsapp_api_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_base_url: String,
    pub whatsapp_api_version: String,
    pub whatsapp_verify_token: String,
    pub brevo_api_key: String,
    pub brevo_sender_email: String,
    pub brevo_sender_name: String,
    pub conversation_timeout_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_API_TOKEN not set, using empty value");
                    String::new()
                }),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_PHONE_NUMBER_ID not set, using empty value");
                    String::new()
                }),
            whatsapp_base_url: env::var("WHATSAPP_BASE_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
            whatsapp_api_version: env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v21.0".to_string()),
            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_VERIFY_TOKEN not set, using empty value");
                    String::new()
                }),
            brevo_api_key: env::var("BREVO_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("BREVO_API_KEY not set, email delivery disabled");
                    String::new()
                }),
            brevo_sender_email: env::var("BREVO_SENDER_EMAIL")
                .unwrap_or_else(|_| String::new()),
            brevo_sender_name: env::var("BREVO_SENDER_NAME")
                .unwrap_or_else(|_| "Sociedad Urológica del Cauca".to_string()),
            conversation_timeout_minutes: env::var("CONVERSATION_TIMEOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && self.is_whatsapp_configured()
    }

    pub fn is_whatsapp_configured(&self) -> bool {
        !self.whatsapp_api_token.is_empty()
            && !self.whatsapp_phone_number_id.is_empty()
            && !self.whatsapp_verify_token.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.brevo_api_key.is_empty() && !self.brevo_sender_email.is_empty()
    }

    /// Full URL of the Cloud API messages endpoint for the configured number.
    pub fn whatsapp_messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.whatsapp_base_url, self.whatsapp_api_version, self.whatsapp_phone_number_id
        )
    }
}
