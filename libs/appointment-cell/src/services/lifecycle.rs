// libs/appointment-cell/src/services/lifecycle.rs
//
// The appointment state machine and the timing rules wrapped around it.
// Terminal statuses have no outgoing edges; everything the engine does runs
// through `can_transition` first.
use shared_models::records::AppointmentStatus;

/// True when the status change is a legal edge of the lifecycle graph.
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;

    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Started)
            | (Confirmed, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, NoShowDoctor)
            | (Confirmed, NoShowPatient)
            | (Started, Completed)
            | (Started, NoShowDoctor)
            | (Started, NoShowPatient)
    )
}

/// Timing thresholds applied by the engine. All windows are measured against
/// the single `now` captured at the start of an operation.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    /// Reschedules are rejected once the appointment is closer than this.
    pub reschedule_lockout_hours: i64,
    /// Patient-initiated cancellations refund only up to this cutoff before
    /// the scheduled time. Doctor cancellations always refund.
    pub refund_cutoff_hours: i64,
    /// Participants may join starting this many minutes early.
    pub join_early_minutes: i64,
    /// Participants may join up to this many minutes after the scheduled time.
    pub join_late_minutes: i64,
    /// No-shows may be recorded once this many minutes have passed.
    pub no_show_after_minutes: i64,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            reschedule_lockout_hours: 24,
            refund_cutoff_hours: 24,
            join_early_minutes: 5,
            join_late_minutes: 60,
            no_show_after_minutes: 30,
        }
    }
}
