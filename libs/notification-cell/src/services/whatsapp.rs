// libs/notification-cell/src/services/whatsapp.rs
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::LifecycleEvent;
use crate::services::dispatcher::NotificationChannel;

/// Sends lifecycle notifications through the WhatsApp business API.
/// Constructed only when the provider credentials are present.
pub struct WhatsAppChannel {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl WhatsAppChannel {
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_whatsapp_configured() {
            return None;
        }

        Some(Self {
            client: reqwest::Client::new(),
            api_url: config.whatsapp_api_url.clone(),
            api_token: config.whatsapp_api_token.clone(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn deliver(&self, recipient: Uuid, event: &LifecycleEvent) -> anyhow::Result<()> {
        let body = json!({
            "recipient_ref": recipient.to_string(),
            "message": event.render(),
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("WhatsApp API returned {}", response.status());
        }

        Ok(())
    }
}
