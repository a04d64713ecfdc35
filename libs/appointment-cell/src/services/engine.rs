// libs/appointment-cell/src/services/engine.rs
//
// Scheduling engine. Every operation captures one `now`, runs its checks and
// writes inside a single store transaction, and only after commit fires
// best-effort notifications. A failed check rolls the whole operation back.
use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use availability_cell::services::slots::{has_conflict, is_within_availability};
use notification_cell::models::LifecycleEvent;
use notification_cell::services::dispatcher::NotificationDispatcher;
use shared_models::actor::{Actor, Role};
use shared_models::records::{
    Appointment, AppointmentStatus, VideoSession, VideoSessionStatus,
};
use shared_store::MemoryStore;
use shared_utils::clock::Clock;
use video_session_cell::models::VideoSessionError;
use video_session_cell::services::token::VideoTokenService;

use crate::models::{
    policy, BookAppointmentRequest, CancelRequest, EndOutcome, JoinResponse, NoShowRequest,
    NoShowType, PaymentWebhookRequest, RescheduleRequest, SchedulingError,
};
use crate::services::ledger;
use crate::services::lifecycle::{can_transition, LifecyclePolicy};

pub struct SchedulingEngine {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    video: Option<VideoTokenService>,
    notifier: NotificationDispatcher,
    policy: LifecyclePolicy,
}

impl SchedulingEngine {
    pub fn new(
        store: Arc<MemoryStore>,
        clock: Arc<dyn Clock>,
        video: Option<VideoTokenService>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            clock,
            video,
            notifier,
            policy: LifecyclePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    pub async fn book(
        &self,
        actor: Actor,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        if actor.role == Role::Patient && actor.id != request.patient_id {
            return Err(SchedulingError::Forbidden(
                "Patients may only book for themselves".to_string(),
            ));
        }
        if actor.role == Role::Doctor {
            return Err(SchedulingError::Forbidden(
                "Doctors cannot book appointments".to_string(),
            ));
        }

        let now = self.clock.now();
        if request.scheduled_at <= now {
            return Err(SchedulingError::Validation(
                "scheduled_at must be in the future".to_string(),
            ));
        }

        let appointment = self
            .store
            .transaction::<Appointment, SchedulingError, _>(|tx| {
                let doctor = tx
                    .doctors
                    .get(&request.doctor_id)
                    .ok_or_else(|| SchedulingError::NotFound("doctor".to_string()))?;
                if !doctor.is_active {
                    return Err(SchedulingError::policy(
                        policy::DOCTOR_UNAVAILABLE,
                        "Doctor is not accepting appointments",
                    ));
                }
                let commission_pct = doctor.commission_pct;

                let patient = tx
                    .patients
                    .get(&request.patient_id)
                    .ok_or_else(|| SchedulingError::NotFound("patient".to_string()))?;
                let country = patient.country.clone();

                let specialty_id = match request.order_id {
                    Some(order_id) => {
                        let order = tx
                            .orders
                            .get(&order_id)
                            .ok_or_else(|| SchedulingError::NotFound("order".to_string()))?;
                        if order.patient_id != request.patient_id {
                            return Err(SchedulingError::policy(
                                policy::ORDER_OWNERSHIP,
                                "Order belongs to a different patient",
                            ));
                        }
                        if let Some(deadline) = order.sla_deadline {
                            if request.scheduled_at > deadline {
                                return Err(SchedulingError::policy(
                                    policy::SLA_EXCEEDED,
                                    "Requested time is past the case deadline",
                                ));
                            }
                        }
                        order.specialty_id
                    }
                    None => request.specialty_id.ok_or_else(|| {
                        SchedulingError::Validation(
                            "specialty_id is required when no order is given".to_string(),
                        )
                    })?,
                };

                let service = tx
                    .services
                    .get(&specialty_id)
                    .ok_or_else(|| SchedulingError::NotFound("service".to_string()))?;

                if !is_within_availability(tx, request.doctor_id, request.scheduled_at) {
                    return Err(SchedulingError::policy(
                        policy::OUTSIDE_AVAILABILITY,
                        "Requested time is outside the doctor's availability",
                    ));
                }
                if has_conflict(tx, request.doctor_id, request.scheduled_at, None) {
                    return Err(SchedulingError::Conflict(
                        "Doctor already has an appointment at this time".to_string(),
                    ));
                }

                let (price, currency) = crate::services::pricing::resolve_price(
                    service,
                    crate::services::pricing::currency_for_country(&country),
                );

                let appointment_id = Uuid::new_v4();
                let payment_id = Uuid::new_v4();
                let video_session_id = Uuid::new_v4();

                let appointment = Appointment {
                    id: appointment_id,
                    order_id: request.order_id,
                    patient_id: request.patient_id,
                    doctor_id: request.doctor_id,
                    specialty_id,
                    scheduled_at: request.scheduled_at,
                    status: AppointmentStatus::Pending,
                    video_session_id,
                    payment_id,
                    price,
                    currency,
                    doctor_commission_pct: commission_pct,
                    rescheduled_from: None,
                    rescheduled_at: None,
                    cancel_reason: None,
                    created_at: now,
                    updated_at: now,
                };

                ledger::create_pending_payment(tx, payment_id, &appointment);
                tx.video_sessions.insert(
                    video_session_id,
                    VideoSession {
                        id: video_session_id,
                        appointment_id,
                        patient_id: appointment.patient_id,
                        doctor_id: appointment.doctor_id,
                        status: VideoSessionStatus::Pending,
                        room_ref: VideoTokenService::room_ref(appointment_id),
                        initiated_by: None,
                        started_at: None,
                        ended_at: None,
                        duration_seconds: None,
                    },
                );
                tx.appointments.insert(appointment_id, appointment.clone());

                Ok(appointment)
            })
            .await?;

        info!(
            "Booked appointment {} for patient {} with doctor {} at {}",
            appointment.id, appointment.patient_id, appointment.doctor_id, appointment.scheduled_at
        );
        self.notifier.notify(
            vec![appointment.patient_id, appointment.doctor_id],
            LifecycleEvent::AppointmentBooked {
                appointment_id: appointment.id,
                scheduled_at: appointment.scheduled_at,
                price: appointment.price,
                currency: appointment.currency.clone(),
            },
        );

        Ok(appointment)
    }

    // ==============================================================================
    // PAYMENT CONFIRMATION
    // ==============================================================================

    /// Apply a provider "paid" callback. Replays and callbacks landing on an
    /// appointment that already left pending are acknowledged without action;
    /// the returned flag says whether this call confirmed the appointment.
    pub async fn confirm_payment(
        &self,
        request: PaymentWebhookRequest,
    ) -> Result<(Appointment, bool), SchedulingError> {
        let now = self.clock.now();

        let (appointment, confirmed) = self
            .store
            .transaction::<(Appointment, bool), SchedulingError, _>(|tx| {
                let payment = tx
                    .payments
                    .get(&request.payment_id)
                    .ok_or_else(|| SchedulingError::NotFound("payment".to_string()))?;
                let appointment_id = payment.appointment_id;

                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                if appointment.status != AppointmentStatus::Pending {
                    info!(
                        "Payment callback for appointment {} in state {}, acknowledging without action",
                        appointment_id, appointment.status
                    );
                    return Ok((appointment, false));
                }

                if !ledger::mark_paid(
                    tx,
                    request.payment_id,
                    request.reference.clone(),
                    request.method.clone(),
                    now,
                ) {
                    // Replayed callback; the earlier delivery already confirmed.
                    return Ok((appointment, false));
                }

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                apt.status = AppointmentStatus::Confirmed;
                apt.updated_at = now;

                Ok((apt.clone(), true))
            })
            .await?;

        if confirmed {
            info!("Appointment {} confirmed by payment", appointment.id);
            self.notifier.notify(
                vec![appointment.patient_id, appointment.doctor_id],
                LifecycleEvent::PaymentConfirmed {
                    appointment_id: appointment.id,
                },
            );
        }

        Ok((appointment, confirmed))
    }

    // ==============================================================================
    // RESCHEDULE / CANCEL
    // ==============================================================================

    pub async fn reschedule(
        &self,
        actor: Actor,
        appointment_id: Uuid,
        request: RescheduleRequest,
    ) -> Result<Appointment, SchedulingError> {
        let now = self.clock.now();
        let lockout = Duration::hours(self.policy.reschedule_lockout_hours);

        let appointment = self
            .store
            .transaction::<Appointment, SchedulingError, _>(|tx| {
                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                if !appointment.is_participant(actor.id) {
                    return Err(SchedulingError::Forbidden(
                        "Only participants may reschedule".to_string(),
                    ));
                }

                if !matches!(
                    appointment.status,
                    AppointmentStatus::Pending | AppointmentStatus::Confirmed
                ) {
                    return Err(SchedulingError::policy(
                        policy::WRONG_STATE,
                        format!("Cannot reschedule a {} appointment", appointment.status),
                    ));
                }

                if appointment.scheduled_at - now < lockout {
                    return Err(SchedulingError::policy(
                        policy::RESCHEDULE_LOCKOUT,
                        format!(
                            "Appointments cannot be rescheduled within {} hours",
                            self.policy.reschedule_lockout_hours
                        ),
                    ));
                }

                if request.new_scheduled_at <= now {
                    return Err(SchedulingError::Validation(
                        "new_scheduled_at must be in the future".to_string(),
                    ));
                }

                if let Some(order_id) = appointment.order_id {
                    let order = tx
                        .orders
                        .get(&order_id)
                        .ok_or_else(|| SchedulingError::NotFound("order".to_string()))?;
                    if let Some(deadline) = order.sla_deadline {
                        if request.new_scheduled_at > deadline {
                            return Err(SchedulingError::policy(
                                policy::SLA_EXCEEDED,
                                "New time is past the case deadline",
                            ));
                        }
                    }
                }

                if !is_within_availability(
                    tx,
                    appointment.doctor_id,
                    request.new_scheduled_at,
                ) {
                    return Err(SchedulingError::policy(
                        policy::OUTSIDE_AVAILABILITY,
                        "New time is outside the doctor's availability",
                    ));
                }
                if has_conflict(
                    tx,
                    appointment.doctor_id,
                    request.new_scheduled_at,
                    Some(appointment_id),
                ) {
                    return Err(SchedulingError::Conflict(
                        "Doctor already has an appointment at the new time".to_string(),
                    ));
                }

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                apt.rescheduled_from = Some(apt.scheduled_at);
                apt.scheduled_at = request.new_scheduled_at;
                apt.rescheduled_at = Some(now);
                apt.updated_at = now;

                Ok(apt.clone())
            })
            .await?;

        info!(
            "Rescheduled appointment {} to {}",
            appointment.id, appointment.scheduled_at
        );
        self.notifier.notify(
            vec![appointment.patient_id, appointment.doctor_id],
            LifecycleEvent::AppointmentRescheduled {
                appointment_id: appointment.id,
                previous_time: appointment
                    .rescheduled_from
                    .unwrap_or(appointment.scheduled_at),
                new_time: appointment.scheduled_at,
            },
        );

        Ok(appointment)
    }

    pub async fn cancel(
        &self,
        actor: Actor,
        appointment_id: Uuid,
        request: CancelRequest,
    ) -> Result<Appointment, SchedulingError> {
        let now = self.clock.now();
        let refund_cutoff = Duration::hours(self.policy.refund_cutoff_hours);

        let (appointment, refunded) = self
            .store
            .transaction::<(Appointment, bool), SchedulingError, _>(|tx| {
                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                authorize_participant_or_admin(&actor, &appointment)?;

                if !can_transition(appointment.status, AppointmentStatus::Cancelled) {
                    return Err(SchedulingError::policy(
                        policy::WRONG_STATE,
                        format!("Cannot cancel a {} appointment", appointment.status),
                    ));
                }

                // Patient cancellations refund only up to the cutoff; doctor
                // and admin cancellations always refund.
                let patient_initiated = actor.id == appointment.patient_id;
                let eligible = !patient_initiated
                    || appointment.scheduled_at - now >= refund_cutoff;

                let reason = request
                    .reason
                    .clone()
                    .unwrap_or_else(|| "cancelled".to_string());
                let refunded = eligible && ledger::refund(tx, appointment_id, &reason, now);

                if let Some(session) = tx.video_sessions.get_mut(&appointment.video_session_id) {
                    session.status = VideoSessionStatus::Cancelled;
                }

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                apt.status = AppointmentStatus::Cancelled;
                apt.cancel_reason = request.reason.clone();
                apt.updated_at = now;

                Ok((apt.clone(), refunded))
            })
            .await?;

        info!(
            "Cancelled appointment {} (refunded: {})",
            appointment.id, refunded
        );
        self.notifier.notify(
            vec![appointment.patient_id, appointment.doctor_id],
            LifecycleEvent::AppointmentCancelled {
                appointment_id: appointment.id,
                reason: appointment.cancel_reason.clone(),
                refunded,
            },
        );

        Ok(appointment)
    }

    // ==============================================================================
    // VIDEO SESSION LIFECYCLE
    // ==============================================================================

    pub async fn join(
        &self,
        actor: Actor,
        appointment_id: Uuid,
    ) -> Result<JoinResponse, SchedulingError> {
        // Resolved before any state change: a misconfigured video stack must
        // not leave a half-started appointment behind.
        let video = self
            .video
            .as_ref()
            .ok_or(SchedulingError::VideoNotConfigured)?;

        let now = self.clock.now();
        let open_from = Duration::minutes(self.policy.join_early_minutes);
        let open_until = Duration::minutes(self.policy.join_late_minutes);

        let (appointment, room_ref) = self
            .store
            .transaction::<(Appointment, String), SchedulingError, _>(|tx| {
                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                if !appointment.is_participant(actor.id) {
                    return Err(SchedulingError::Forbidden(
                        "Only participants may join the consultation".to_string(),
                    ));
                }

                if !matches!(
                    appointment.status,
                    AppointmentStatus::Confirmed | AppointmentStatus::Started
                ) {
                    return Err(SchedulingError::policy(
                        policy::WRONG_STATE,
                        format!("Cannot join a {} appointment", appointment.status),
                    ));
                }

                if now < appointment.scheduled_at - open_from
                    || now > appointment.scheduled_at + open_until
                {
                    return Err(SchedulingError::policy(
                        policy::JOIN_WINDOW,
                        "The consultation room is not open at this time",
                    ));
                }

                let session = tx
                    .video_sessions
                    .get_mut(&appointment.video_session_id)
                    .ok_or_else(|| SchedulingError::NotFound("video session".to_string()))?;
                if session.status == VideoSessionStatus::Pending {
                    session.status = VideoSessionStatus::Active;
                    session.started_at = Some(now);
                    session.initiated_by = Some(actor.id);
                }
                let room_ref = session.room_ref.clone();

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                if apt.status == AppointmentStatus::Confirmed {
                    apt.status = AppointmentStatus::Started;
                }
                apt.updated_at = now;

                Ok((apt.clone(), room_ref))
            })
            .await?;

        let identity = VideoTokenService::identity(actor.role, actor.id);
        let session = video
            .issue_token(&room_ref, &identity, now)
            .map_err(|e| match e {
                VideoSessionError::NotConfigured => SchedulingError::VideoNotConfigured,
                VideoSessionError::Signing(msg) => SchedulingError::Storage(msg),
            })?;

        info!(
            "{} joined appointment {} in {}",
            identity, appointment.id, room_ref
        );
        self.notifier.notify(
            vec![appointment.patient_id, appointment.doctor_id],
            LifecycleEvent::ParticipantJoined {
                appointment_id: appointment.id,
                participant_role: actor.role.as_str().to_string(),
            },
        );

        Ok(JoinResponse {
            appointment,
            session,
        })
    }

    pub async fn end(
        &self,
        actor: Actor,
        appointment_id: Uuid,
    ) -> Result<EndOutcome, SchedulingError> {
        let now = self.clock.now();

        let outcome = self
            .store
            .transaction::<EndOutcome, SchedulingError, _>(|tx| {
                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                if !appointment.is_participant(actor.id) {
                    return Err(SchedulingError::Forbidden(
                        "Only participants may end the consultation".to_string(),
                    ));
                }

                if !can_transition(appointment.status, AppointmentStatus::Completed) {
                    return Err(SchedulingError::policy(
                        policy::WRONG_STATE,
                        format!("Cannot end a {} appointment", appointment.status),
                    ));
                }

                let session = tx
                    .video_sessions
                    .get_mut(&appointment.video_session_id)
                    .ok_or_else(|| SchedulingError::NotFound("video session".to_string()))?;
                // Ended without anyone joining counts as a zero-length call.
                let duration_seconds = session
                    .started_at
                    .map(|started| (now - started).num_seconds())
                    .unwrap_or(0);
                session.status = VideoSessionStatus::Ended;
                session.ended_at = Some(now);
                session.duration_seconds = Some(duration_seconds);

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                apt.status = AppointmentStatus::Completed;
                apt.updated_at = now;
                let appointment = apt.clone();

                let earning = ledger::record_earning(tx, &appointment);

                Ok(EndOutcome {
                    appointment,
                    duration_seconds,
                    earning,
                })
            })
            .await?;

        info!(
            "Completed appointment {} after {}s",
            outcome.appointment.id, outcome.duration_seconds
        );
        self.notifier.notify(
            vec![
                outcome.appointment.patient_id,
                outcome.appointment.doctor_id,
            ],
            LifecycleEvent::ConsultationCompleted {
                appointment_id: outcome.appointment.id,
                duration_seconds: outcome.duration_seconds,
            },
        );

        Ok(outcome)
    }

    // ==============================================================================
    // NO-SHOW
    // ==============================================================================

    pub async fn mark_no_show(
        &self,
        actor: Actor,
        appointment_id: Uuid,
        request: NoShowRequest,
    ) -> Result<Appointment, SchedulingError> {
        let now = self.clock.now();
        let grace = Duration::minutes(self.policy.no_show_after_minutes);

        let target_status = match request.no_show_type {
            NoShowType::Doctor => AppointmentStatus::NoShowDoctor,
            NoShowType::Patient => AppointmentStatus::NoShowPatient,
        };

        let appointment = self
            .store
            .transaction::<Appointment, SchedulingError, _>(|tx| {
                let appointment = tx
                    .appointments
                    .get(&appointment_id)
                    .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?
                    .clone();

                if actor.id != appointment.doctor_id && !actor.is_admin_equivalent() {
                    return Err(SchedulingError::Forbidden(
                        "Only the doctor or an administrator may record a no-show".to_string(),
                    ));
                }

                if !can_transition(appointment.status, target_status) {
                    return Err(SchedulingError::policy(
                        policy::WRONG_STATE,
                        format!(
                            "Cannot record a no-show on a {} appointment",
                            appointment.status
                        ),
                    ));
                }

                if now < appointment.scheduled_at + grace {
                    return Err(SchedulingError::policy(
                        policy::NO_SHOW_TOO_EARLY,
                        format!(
                            "No-shows may be recorded {} minutes after the scheduled time",
                            self.policy.no_show_after_minutes
                        ),
                    ));
                }

                match request.no_show_type {
                    // The doctor failed to attend: the patient gets their
                    // money back and no earning accrues.
                    NoShowType::Doctor => {
                        ledger::refund(tx, appointment_id, "doctor no-show", now);
                    }
                    // The patient failed to attend: the fee is kept and the
                    // doctor is paid for the reserved slot.
                    NoShowType::Patient => {
                        ledger::record_earning(tx, &appointment);
                    }
                }

                if let Some(session) = tx.video_sessions.get_mut(&appointment.video_session_id) {
                    if session.status != VideoSessionStatus::Ended {
                        session.status = VideoSessionStatus::Cancelled;
                    }
                }

                let apt = tx
                    .appointments
                    .get_mut(&appointment_id)
                    .expect("appointment present in the same staged tables");
                apt.status = target_status;
                apt.updated_at = now;

                Ok(apt.clone())
            })
            .await?;

        info!(
            "Recorded {} on appointment {}",
            appointment.status, appointment.id
        );
        self.notifier.notify(
            vec![appointment.patient_id, appointment.doctor_id],
            LifecycleEvent::NoShowRecorded {
                appointment_id: appointment.id,
                no_show_by: match request.no_show_type {
                    NoShowType::Doctor => "doctor".to_string(),
                    NoShowType::Patient => "patient".to_string(),
                },
            },
        );

        Ok(appointment)
    }

    // ==============================================================================
    // READS
    // ==============================================================================

    pub async fn get(
        &self,
        actor: Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .store
            .read(|t| t.appointments.get(&appointment_id).cloned())
            .await
            .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?;

        authorize_participant_or_admin(&actor, &appointment)?;
        Ok(appointment)
    }
}

fn authorize_participant_or_admin(
    actor: &Actor,
    appointment: &Appointment,
) -> Result<(), SchedulingError> {
    if actor.is_admin_equivalent() || appointment.is_participant(actor.id) {
        Ok(())
    } else {
        Err(SchedulingError::Forbidden(
            "Not a participant of this appointment".to_string(),
        ))
    }
}
