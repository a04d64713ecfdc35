// libs/notification-cell/src/services/dispatcher.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::LifecycleEvent;

/// A delivery channel for lifecycle notifications.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, recipient: Uuid, event: &LifecycleEvent) -> anyhow::Result<()>;
}

/// Fans a lifecycle event out to every configured channel for every
/// recipient. Delivery runs on detached tasks so a slow or failing channel
/// never blocks the caller; failures are logged and swallowed.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    /// Dispatcher with no channels, useful in tests.
    pub fn disabled() -> Self {
        Self { channels: vec![] }
    }

    pub fn notify(&self, recipients: Vec<Uuid>, event: LifecycleEvent) {
        for channel in &self.channels {
            for recipient in &recipients {
                let channel = Arc::clone(channel);
                let recipient = *recipient;
                let event = event.clone();

                tokio::spawn(async move {
                    match channel.deliver(recipient, &event).await {
                        Ok(()) => {
                            info!(
                                "Delivered {} notification to {} via {}",
                                event_label(&event),
                                recipient,
                                channel.name()
                            );
                        }
                        Err(e) => {
                            warn!(
                                "Failed to deliver {} notification to {} via {}: {}",
                                event_label(&event),
                                recipient,
                                channel.name(),
                                e
                            );
                        }
                    }
                });
            }
        }
    }
}

fn event_label(event: &LifecycleEvent) -> &'static str {
    match event {
        LifecycleEvent::AppointmentBooked { .. } => "appointment_booked",
        LifecycleEvent::PaymentConfirmed { .. } => "payment_confirmed",
        LifecycleEvent::AppointmentRescheduled { .. } => "appointment_rescheduled",
        LifecycleEvent::AppointmentCancelled { .. } => "appointment_cancelled",
        LifecycleEvent::ParticipantJoined { .. } => "participant_joined",
        LifecycleEvent::ConsultationCompleted { .. } => "consultation_completed",
        LifecycleEvent::NoShowRecorded { .. } => "no_show_recorded",
    }
}

/// Channel that records deliveries in the application log. Always available,
/// regardless of external provider configuration.
pub struct InternalChannel;

#[async_trait]
impl NotificationChannel for InternalChannel {
    fn name(&self) -> &'static str {
        "internal"
    }

    async fn deliver(&self, recipient: Uuid, event: &LifecycleEvent) -> anyhow::Result<()> {
        info!("[notify {}] {}", recipient, event.render());
        Ok(())
    }
}
