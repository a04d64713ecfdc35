// libs/appointment-cell/src/services/ledger.rs
//
// Payment and earnings ledger writes. Every function here mutates a staged
// `Tables` copy inside the caller's transaction, so partial ledger writes can
// never become visible.
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use shared_models::records::{Appointment, Earning, EarningStatus, Payment, PaymentStatus};
use shared_store::Tables;

use crate::services::pricing::round_half_up;

/// Create the appointment's single pending payment row. The id is chosen by
/// the caller so the appointment can reference it in the same transaction.
pub fn create_pending_payment(tables: &mut Tables, payment_id: Uuid, appointment: &Appointment) {
    tables.payments.insert(
        payment_id,
        Payment {
            id: payment_id,
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            amount: appointment.price,
            currency: appointment.currency.clone(),
            status: PaymentStatus::Pending,
            method: None,
            reference: None,
            paid_at: None,
            refund_reason: None,
            refunded_at: None,
        },
    );
}

/// Mark a pending payment as paid. Returns false when the payment was already
/// past pending; the caller treats that as an idempotent no-op.
pub fn mark_paid(
    tables: &mut Tables,
    payment_id: Uuid,
    reference: Option<String>,
    method: Option<String>,
    now: DateTime<Utc>,
) -> bool {
    let Some(payment) = tables.payments.get_mut(&payment_id) else {
        return false;
    };

    if payment.status != PaymentStatus::Pending {
        info!(
            "Payment {} already {}, confirm is a no-op",
            payment_id, payment.status
        );
        return false;
    }

    payment.status = PaymentStatus::Paid;
    payment.reference = reference;
    payment.method = method;
    payment.paid_at = Some(now);
    true
}

/// Refund the appointment's payment if it was paid. The transition is one-way;
/// a pending or already-refunded payment is left untouched. Returns whether a
/// refund was issued.
pub fn refund(
    tables: &mut Tables,
    appointment_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> bool {
    let payment_id = tables
        .payment_for_appointment(appointment_id)
        .filter(|p| p.status == PaymentStatus::Paid)
        .map(|p| p.id);

    let Some(payment_id) = payment_id else {
        return false;
    };

    let payment = tables
        .payments
        .get_mut(&payment_id)
        .expect("payment id came from the same staged tables");
    payment.status = PaymentStatus::Refunded;
    payment.refund_reason = Some(reason.to_string());
    payment.refunded_at = Some(now);

    info!("Refunded payment {} ({})", payment_id, reason);
    true
}

/// Accrue the doctor's earning for a closed appointment, at most once. The
/// earned amount is the only figure that gets rounded.
pub fn record_earning(tables: &mut Tables, appointment: &Appointment) -> Option<Earning> {
    if tables.earning_for_appointment(appointment.id).is_some() {
        return None;
    }

    let earned = round_half_up(appointment.price * appointment.doctor_commission_pct / 100.0);
    let earning = Earning {
        id: Uuid::new_v4(),
        doctor_id: appointment.doctor_id,
        appointment_id: appointment.id,
        gross_amount: appointment.price,
        commission_pct: appointment.doctor_commission_pct,
        earned_amount: earned,
        status: EarningStatus::Accrued,
    };
    tables.earnings.insert(earning.id, earning.clone());

    info!(
        "Accrued {} {} for doctor {} on appointment {}",
        earned, appointment.currency, appointment.doctor_id, appointment.id
    );
    Some(earning)
}
