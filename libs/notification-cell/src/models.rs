// libs/notification-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle events delivered to appointment participants. Delivery is
/// best-effort and happens after the owning transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    AppointmentBooked {
        appointment_id: Uuid,
        scheduled_at: DateTime<Utc>,
        price: f64,
        currency: String,
    },
    PaymentConfirmed {
        appointment_id: Uuid,
    },
    AppointmentRescheduled {
        appointment_id: Uuid,
        previous_time: DateTime<Utc>,
        new_time: DateTime<Utc>,
    },
    AppointmentCancelled {
        appointment_id: Uuid,
        reason: Option<String>,
        refunded: bool,
    },
    ParticipantJoined {
        appointment_id: Uuid,
        participant_role: String,
    },
    ConsultationCompleted {
        appointment_id: Uuid,
        duration_seconds: i64,
    },
    NoShowRecorded {
        appointment_id: Uuid,
        no_show_by: String,
    },
}

impl LifecycleEvent {
    /// Human-readable message used by text channels.
    pub fn render(&self) -> String {
        match self {
            LifecycleEvent::AppointmentBooked {
                scheduled_at,
                price,
                currency,
                ..
            } => format!(
                "Your consultation is booked for {} ({:.2} {})",
                scheduled_at.format("%Y-%m-%d %H:%M UTC"),
                price,
                currency
            ),
            LifecycleEvent::PaymentConfirmed { .. } => {
                "Payment received, your consultation is confirmed".to_string()
            }
            LifecycleEvent::AppointmentRescheduled { new_time, .. } => format!(
                "Your consultation was moved to {}",
                new_time.format("%Y-%m-%d %H:%M UTC")
            ),
            LifecycleEvent::AppointmentCancelled { refunded, .. } => {
                if *refunded {
                    "Your consultation was cancelled and the payment refunded".to_string()
                } else {
                    "Your consultation was cancelled".to_string()
                }
            }
            LifecycleEvent::ParticipantJoined {
                participant_role, ..
            } => format!("The {} has joined the consultation room", participant_role),
            LifecycleEvent::ConsultationCompleted {
                duration_seconds, ..
            } => format!(
                "Consultation completed ({})",
                format_duration(*duration_seconds)
            ),
            LifecycleEvent::NoShowRecorded { no_show_by, .. } => {
                format!("Consultation closed: {} did not attend", no_show_by)
            }
        }
    }
}

pub fn format_duration(seconds: i64) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{}m {:02}s", minutes, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "0m 00s");
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(600), "10m 00s");
        assert_eq!(format_duration(605), "10m 05s");
    }
}
