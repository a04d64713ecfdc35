// libs/availability-cell/src/services/availability.rs
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_models::records::AvailabilitySlot;
use shared_store::MemoryStore;

use crate::models::{
    AvailabilityError, SaveAvailabilityRequest, MAX_WEEKLY_ENTRIES, SUPPORTED_TIMEZONES,
};

pub struct AvailabilityService {
    store: Arc<MemoryStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Replace a doctor's entire weekly availability. Delete-then-reinsert in
    /// one transaction, so readers never observe a half-replaced week.
    ///
    /// Overlapping windows on the same day are accepted; each one is an
    /// independently matchable window.
    pub async fn save_week(
        &self,
        doctor_id: Uuid,
        request: SaveAvailabilityRequest,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        debug!("Saving weekly availability for doctor {}", doctor_id);

        self.validate_request(&request)?;

        let timezone = request.timezone.clone();
        let saved = self
            .store
            .transaction(|tx| {
                tx.availability.retain(|slot| slot.doctor_id != doctor_id);

                let mut saved = Vec::with_capacity(request.slots.len());
                for entry in &request.slots {
                    let slot = AvailabilitySlot {
                        id: Uuid::new_v4(),
                        doctor_id,
                        day_of_week: entry.day_of_week,
                        start_time: entry.start_time,
                        end_time: entry.end_time,
                        timezone: timezone.clone(),
                        active: true,
                    };
                    tx.availability.push(slot.clone());
                    saved.push(slot);
                }

                Ok::<_, AvailabilityError>(saved)
            })
            .await?;

        info!(
            "Replaced availability for doctor {}: {} windows ({})",
            doctor_id,
            saved.len(),
            timezone
        );
        Ok(saved)
    }

    pub async fn get_for_doctor(&self, doctor_id: Uuid) -> Vec<AvailabilitySlot> {
        self.store
            .read(|t| {
                let mut slots: Vec<AvailabilitySlot> = t
                    .availability_for_doctor(doctor_id)
                    .into_iter()
                    .cloned()
                    .collect();
                slots.sort_by_key(|s| (s.day_of_week, s.start_time));
                slots
            })
            .await
    }

    fn validate_request(&self, request: &SaveAvailabilityRequest) -> Result<(), AvailabilityError> {
        if request.slots.len() > MAX_WEEKLY_ENTRIES {
            return Err(AvailabilityError::Validation(format!(
                "At most {} availability windows may be submitted",
                MAX_WEEKLY_ENTRIES
            )));
        }

        if !SUPPORTED_TIMEZONES.contains(&request.timezone.as_str()) {
            return Err(AvailabilityError::UnsupportedTimezone(
                request.timezone.clone(),
            ));
        }
        // The slot validator later parses this as an IANA name.
        if request.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(AvailabilityError::UnsupportedTimezone(
                request.timezone.clone(),
            ));
        }

        for entry in &request.slots {
            if entry.day_of_week > 6 {
                return Err(AvailabilityError::Validation(
                    "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
                ));
            }
            if entry.start_time >= entry.end_time {
                return Err(AvailabilityError::Validation(
                    "Start time must be before end time".to_string(),
                ));
            }
        }

        Ok(())
    }
}
