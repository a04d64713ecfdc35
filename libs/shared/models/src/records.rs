// libs/shared/models/src/records.rs
//
// Row types persisted in the shared transactional store. These are the
// storage-boundary shapes: multi-currency price tables arrive as a typed
// mapping, statuses are closed enums with snake_case wire names.
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// PEOPLE AND CASES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub display_name: String,
    /// Doctor's share of the appointment price, copied onto each appointment
    /// at booking time.
    pub commission_pct: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub display_name: String,
    /// ISO 3166-1 alpha-2 country code, drives the billing currency lookup.
    pub country: String,
}

/// A second-opinion case an appointment may be linked to. The SLA deadline
/// constrains rescheduling but is owned by the case pipeline, not by us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub specialty_id: Uuid,
    pub sla_deadline: Option<DateTime<Utc>>,
}

/// Consultation service definition with its multi-currency price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyService {
    pub id: Uuid,
    pub name: String,
    pub base_price: f64,
    pub prices_by_currency: HashMap<String, f64>,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

/// One weekly recurring open window. A doctor may publish several windows for
/// the same day; each is matched independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday, in the slot's own timezone.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub timezone: String,
    pub active: bool,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Started,
    Completed,
    Cancelled,
    NoShowDoctor,
    NoShowPatient,
}

impl AppointmentStatus {
    /// Statuses that hold a doctor's slot and therefore block other bookings.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed | AppointmentStatus::Started
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShowDoctor
                | AppointmentStatus::NoShowPatient
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Started => write!(f, "started"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShowDoctor => write!(f, "no_show_doctor"),
            AppointmentStatus::NoShowPatient => write!(f, "no_show_patient"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub specialty_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub video_session_id: Uuid,
    pub payment_id: Uuid,
    /// Raw price as resolved at booking, stored unrounded.
    pub price: f64,
    pub currency: String,
    pub doctor_commission_pct: f64,
    pub rescheduled_from: Option<DateTime<Utc>>,
    pub rescheduled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

// ==============================================================================
// PAYMENT LEDGER
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// Exactly one live payment per appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
}

// ==============================================================================
// VIDEO SESSIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSessionStatus {
    Pending,
    Active,
    Ended,
    Cancelled,
}

/// Call-specific timing, tracked independently of appointment metadata. An
/// appointment can be confirmed while its session is still pending until the
/// first participant joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSession {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub status: VideoSessionStatus,
    pub room_ref: String,
    pub initiated_by: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

// ==============================================================================
// EARNINGS LEDGER
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningStatus {
    Accrued,
    Settled,
}

/// At most one per appointment, created at the completed or no_show_patient
/// transition. The earned amount is the only rounded figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Earning {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Uuid,
    pub gross_amount: f64,
    pub commission_pct: f64,
    pub earned_amount: f64,
    pub status: EarningStatus,
}
