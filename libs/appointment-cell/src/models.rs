// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::records::{Appointment, Earning};
use shared_store::StorageError;
use video_session_cell::models::SessionToken;

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Second-opinion case this consultation belongs to, if any.
    pub order_id: Option<Uuid>,
    /// Required when no order is given; otherwise taken from the order.
    pub specialty_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub new_scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoShowType {
    Doctor,
    Patient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoShowRequest {
    pub no_show_type: NoShowType,
}

/// Payment provider callback payload. The provider reports its own status
/// string; anything other than "paid" is acknowledged without action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookRequest {
    pub payment_id: Uuid,
    pub status: String,
    pub reference: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub appointment: Appointment,
    pub session: SessionToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndOutcome {
    pub appointment: Appointment,
    pub duration_seconds: i64,
    pub earning: Option<Earning>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

/// Policy rejection codes surfaced to clients alongside a 422.
pub mod policy {
    pub const OUTSIDE_AVAILABILITY: &str = "outside_availability";
    pub const DOCTOR_UNAVAILABLE: &str = "doctor_unavailable";
    pub const ORDER_OWNERSHIP: &str = "order_ownership";
    pub const SLA_EXCEEDED: &str = "sla_exceeded";
    pub const WRONG_STATE: &str = "wrong_state";
    pub const RESCHEDULE_LOCKOUT: &str = "reschedule_lockout";
    pub const JOIN_WINDOW: &str = "join_window";
    pub const NO_SHOW_TOO_EARLY: &str = "no_show_too_early";
}

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{message}")]
    Policy { code: &'static str, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Video conferencing is not configured")]
    VideoNotConfigured,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SchedulingError {
    pub fn policy(code: &'static str, message: impl Into<String>) -> Self {
        SchedulingError::Policy {
            code,
            message: message.into(),
        }
    }
}

impl From<StorageError> for SchedulingError {
    fn from(e: StorageError) -> Self {
        SchedulingError::Storage(e.to_string())
    }
}
