use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub payment_webhook_secret: String,
    pub video_signing_key: String,
    pub video_token_ttl_minutes: i64,
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_WEBHOOK_SECRET not set, using empty value");
                    String::new()
                }),
            video_signing_key: env::var("VIDEO_SIGNING_KEY")
                .unwrap_or_else(|_| {
                    warn!("VIDEO_SIGNING_KEY not set, using empty value");
                    String::new()
                }),
            video_token_ttl_minutes: env::var("VIDEO_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_API_URL not set, using empty value");
                    String::new()
                }),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_API_TOKEN not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.payment_webhook_secret.is_empty()
    }

    pub fn is_video_configured(&self) -> bool {
        !self.video_signing_key.is_empty()
    }

    pub fn is_whatsapp_configured(&self) -> bool {
        !self.whatsapp_api_url.is_empty() && !self.whatsapp_api_token.is_empty()
    }
}
