// libs/availability-cell/tests/availability_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use availability_cell::models::{
    AvailabilityError, SaveAvailabilityRequest, WeeklySlotEntry,
};
use availability_cell::services::availability::AvailabilityService;
use availability_cell::services::slots::{has_conflict, is_within_availability};
use shared_models::records::{Appointment, AppointmentStatus, AvailabilitySlot};
use shared_store::{MemoryStore, StorageError};

fn entry(day: u8, start: (u32, u32), end: (u32, u32)) -> WeeklySlotEntry {
    WeeklySlotEntry {
        day_of_week: day,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
    }
}

fn request(timezone: &str, slots: Vec<WeeklySlotEntry>) -> SaveAvailabilityRequest {
    SaveAvailabilityRequest {
        timezone: timezone.to_string(),
        slots,
    }
}

#[tokio::test]
async fn saving_replaces_the_previous_week_entirely() {
    let store = Arc::new(MemoryStore::new());
    let service = AvailabilityService::new(store.clone());
    let doctor = Uuid::new_v4();

    service
        .save_week(
            doctor,
            request("UTC", vec![entry(1, (9, 0), (12, 0)), entry(3, (14, 0), (17, 0))]),
        )
        .await
        .unwrap();

    let saved = service
        .save_week(doctor, request("Africa/Cairo", vec![entry(5, (10, 0), (13, 0))]))
        .await
        .unwrap();

    assert_eq!(saved.len(), 1);

    let slots = service.get_for_doctor(doctor).await;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].day_of_week, 5);
    assert_eq!(slots[0].timezone, "Africa/Cairo");
}

#[tokio::test]
async fn replacement_does_not_touch_other_doctors() {
    let store = Arc::new(MemoryStore::new());
    let service = AvailabilityService::new(store.clone());
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    service
        .save_week(first, request("UTC", vec![entry(1, (9, 0), (12, 0))]))
        .await
        .unwrap();
    service
        .save_week(second, request("UTC", vec![entry(2, (9, 0), (12, 0))]))
        .await
        .unwrap();

    service.save_week(first, request("UTC", vec![])).await.unwrap();

    assert!(service.get_for_doctor(first).await.is_empty());
    assert_eq!(service.get_for_doctor(second).await.len(), 1);
}

#[tokio::test]
async fn unsupported_timezone_is_rejected() {
    let service = AvailabilityService::new(Arc::new(MemoryStore::new()));

    let result = service
        .save_week(
            Uuid::new_v4(),
            request("Mars/Olympus_Mons", vec![entry(1, (9, 0), (12, 0))]),
        )
        .await;

    assert_matches!(result, Err(AvailabilityError::UnsupportedTimezone(_)));
}

#[tokio::test]
async fn more_than_seven_windows_are_rejected() {
    let service = AvailabilityService::new(Arc::new(MemoryStore::new()));

    let slots = (0..8).map(|_| entry(1, (9, 0), (10, 0))).collect();
    let result = service.save_week(Uuid::new_v4(), request("UTC", slots)).await;

    assert_matches!(result, Err(AvailabilityError::Validation(_)));
}

#[tokio::test]
async fn inverted_window_is_rejected() {
    let service = AvailabilityService::new(Arc::new(MemoryStore::new()));

    let result = service
        .save_week(Uuid::new_v4(), request("UTC", vec![entry(1, (12, 0), (9, 0))]))
        .await;

    assert_matches!(result, Err(AvailabilityError::Validation(_)));
}

// ==============================================================================
// SLOT VALIDATION
// ==============================================================================

fn cairo_monday_morning(doctor: Uuid) -> AvailabilitySlot {
    AvailabilitySlot {
        id: Uuid::new_v4(),
        doctor_id: doctor,
        day_of_week: 1,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        timezone: "Africa/Cairo".to_string(),
        active: true,
    }
}

#[tokio::test]
async fn window_match_uses_the_slots_own_timezone() {
    let store = MemoryStore::new();
    let doctor = Uuid::new_v4();

    store
        .transaction::<_, StorageError, _>(|tx| {
            tx.availability.push(cairo_monday_morning(doctor));
            Ok(())
        })
        .await
        .unwrap();

    // Cairo is UTC+3 in June 2025. 06:00 UTC on Monday is 09:00 local, the
    // inclusive start; 09:00 UTC is 12:00 local, the exclusive end.
    let start = Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    let just_before_end = Utc.with_ymd_and_hms(2025, 6, 2, 8, 59, 0).unwrap();

    store
        .read(|t| {
            assert!(is_within_availability(t, doctor, start));
            assert!(is_within_availability(t, doctor, just_before_end));
            assert!(!is_within_availability(t, doctor, end));
        })
        .await;
}

#[tokio::test]
async fn inactive_windows_never_match() {
    let store = MemoryStore::new();
    let doctor = Uuid::new_v4();

    store
        .transaction::<_, StorageError, _>(|tx| {
            let mut slot = cairo_monday_morning(doctor);
            slot.active = false;
            tx.availability.push(slot);
            Ok(())
        })
        .await
        .unwrap();

    let candidate = Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).unwrap();
    let matched = store
        .read(|t| is_within_availability(t, doctor, candidate))
        .await;
    assert!(!matched);
}

fn appointment_at(
    doctor: Uuid,
    at: chrono::DateTime<Utc>,
    status: AppointmentStatus,
) -> Appointment {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    Appointment {
        id: Uuid::new_v4(),
        order_id: None,
        patient_id: Uuid::new_v4(),
        doctor_id: doctor,
        specialty_id: Uuid::new_v4(),
        scheduled_at: at,
        status,
        video_session_id: Uuid::new_v4(),
        payment_id: Uuid::new_v4(),
        price: 150.0,
        currency: "USD".to_string(),
        doctor_commission_pct: 70.0,
        rescheduled_from: None,
        rescheduled_at: None,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn terminal_appointments_do_not_block_the_slot() {
    let store = MemoryStore::new();
    let doctor = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();

    store
        .transaction::<_, StorageError, _>(|tx| {
            let apt = appointment_at(doctor, at, AppointmentStatus::Cancelled);
            tx.appointments.insert(apt.id, apt);
            Ok(())
        })
        .await
        .unwrap();

    let blocked = store.read(|t| has_conflict(t, doctor, at, None)).await;
    assert!(!blocked);
}

#[tokio::test]
async fn conflict_check_can_exclude_the_appointment_being_moved() {
    let store = MemoryStore::new();
    let doctor = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();

    let apt = appointment_at(doctor, at, AppointmentStatus::Confirmed);
    let apt_id = apt.id;

    store
        .transaction::<_, StorageError, _>(|tx| {
            tx.appointments.insert(apt_id, apt.clone());
            Ok(())
        })
        .await
        .unwrap();

    store
        .read(|t| {
            assert!(has_conflict(t, doctor, at, None));
            assert!(!has_conflict(t, doctor, at, Some(apt_id)));
        })
        .await;
}
