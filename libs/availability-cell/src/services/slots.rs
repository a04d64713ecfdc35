// libs/availability-cell/src/services/slots.rs
//
// Pure slot validation over a table snapshot. Both checks are read-only and
// are meant to be called from inside the same transaction that inserts the
// appointment, closing the double-booking race.
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use tracing::debug;
use uuid::Uuid;

use shared_store::Tables;

/// True if `candidate` falls inside an active availability window for the
/// doctor. The instant is converted into each window's own timezone before
/// comparing weekday and time of day. Start is inclusive, end exclusive, so a
/// minute sitting on the boundary of two adjacent windows matches exactly one.
pub fn is_within_availability(tables: &Tables, doctor_id: Uuid, candidate: DateTime<Utc>) -> bool {
    tables
        .availability
        .iter()
        .filter(|slot| slot.doctor_id == doctor_id && slot.active)
        .any(|slot| {
            let tz: Tz = match slot.timezone.parse() {
                Ok(tz) => tz,
                Err(_) => {
                    debug!("skipping window with unparseable timezone {}", slot.timezone);
                    return false;
                }
            };
            let local = candidate.with_timezone(&tz);
            let day = local.weekday().num_days_from_sunday() as u8;
            let time = local.time();

            day == slot.day_of_week && slot.start_time <= time && time < slot.end_time
        })
}

/// True if the doctor already has a slot-holding appointment at exactly this
/// instant. Pending, confirmed, and started appointments all block; terminal
/// ones never do. The appointment being rescheduled is excluded by id.
pub fn has_conflict(
    tables: &Tables,
    doctor_id: Uuid,
    candidate: DateTime<Utc>,
    exclude_appointment_id: Option<Uuid>,
) -> bool {
    tables.appointments.values().any(|apt| {
        apt.doctor_id == doctor_id
            && apt.scheduled_at == candidate
            && apt.status.is_active()
            && Some(apt.id) != exclude_appointment_id
    })
}
