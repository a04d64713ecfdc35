// libs/video-session-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque join capability for one participant in one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub room_ref: String,
    pub identity: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum VideoSessionError {
    #[error("Video conferencing is not configured")]
    NotConfigured,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
