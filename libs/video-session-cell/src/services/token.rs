// libs/video-session-cell/src/services/token.rs
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::actor::Role;

use crate::models::{SessionToken, VideoSessionError};

type HmacSha256 = Hmac<Sha256>;

/// Issues join capabilities for video rooms. The room reference is derived
/// deterministically from the appointment id, so both participants land in
/// the same room without coordination; the token binds a participant identity
/// to that room until the expiry.
pub struct VideoTokenService {
    signing_key: String,
    token_ttl: Duration,
}

impl VideoTokenService {
    pub fn new(config: &AppConfig) -> Result<Self, VideoSessionError> {
        if !config.is_video_configured() {
            return Err(VideoSessionError::NotConfigured);
        }

        Ok(Self {
            signing_key: config.video_signing_key.clone(),
            token_ttl: Duration::minutes(config.video_token_ttl_minutes),
        })
    }

    /// Stable room reference for an appointment.
    pub fn room_ref(appointment_id: Uuid) -> String {
        format!("room-{}", appointment_id)
    }

    /// Stable participant identity: role plus user id.
    pub fn identity(role: Role, user_id: Uuid) -> String {
        format!("{}:{}", role.as_str(), user_id)
    }

    pub fn issue_token(
        &self,
        room_ref: &str,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, VideoSessionError> {
        let expires_at = now + self.token_ttl;
        let payload = format!("{}:{}:{}", room_ref, identity, expires_at.timestamp());

        let mut mac = HmacSha256::new_from_slice(self.signing_key.as_bytes())
            .map_err(|e| VideoSessionError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            signature
        );

        info!("Issued video token for {} in {}", identity, room_ref);

        Ok(SessionToken {
            token,
            room_ref: room_ref.to_string(),
            identity: identity.to_string(),
            expires_at,
        })
    }
}
