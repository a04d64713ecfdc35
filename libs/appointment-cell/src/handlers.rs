// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::actor::Actor;
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, CancelRequest, NoShowRequest, PaymentWebhookRequest,
    RescheduleRequest, SchedulingError,
};
use crate::services::engine::SchedulingEngine;

/// Shared state for the appointment cell.
pub struct EngineState {
    pub engine: SchedulingEngine,
    pub config: AppConfig,
}

fn map_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::Validation(msg) => AppError::BadRequest(msg),
        SchedulingError::Policy { code, message } => AppError::Policy { code, message },
        SchedulingError::Conflict(msg) => AppError::Conflict(msg),
        SchedulingError::NotFound(what) => AppError::NotFound(what),
        SchedulingError::Forbidden(msg) => AppError::Auth(msg),
        SchedulingError::VideoNotConfigured => {
            AppError::ExternalService("Video conferencing is not configured".to_string())
        }
        SchedulingError::Storage(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<EngineState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .book(actor, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked, awaiting payment"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.engine.get(actor, id).await.map_err(map_error)?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .reschedule(actor, id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .cancel(actor, id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn join_appointment(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let joined = state.engine.join(actor, id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": joined.appointment,
        "session": joined.session
    })))
}

#[axum::debug_handler]
pub async fn end_appointment(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.engine.end(actor, id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.appointment,
        "duration_seconds": outcome.duration_seconds,
        "earning": outcome.earning
    })))
}

#[axum::debug_handler]
pub async fn record_no_show(
    State(state): State<Arc<EngineState>>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<NoShowRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .mark_no_show(actor, id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// Payment provider callback. Authenticated by a shared secret header rather
/// than by the actor middleware; an unknown provider status is acknowledged
/// without touching any state.
#[axum::debug_handler]
pub async fn confirm_payment_webhook(
    State(state): State<Arc<EngineState>>,
    headers: HeaderMap,
    Json(request): Json<PaymentWebhookRequest>,
) -> Result<Json<Value>, AppError> {
    let provided = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if state.config.payment_webhook_secret.is_empty()
        || provided != state.config.payment_webhook_secret
    {
        return Err(AppError::Auth("Invalid webhook secret".to_string()));
    }

    if request.status != "paid" {
        info!(
            "Ignoring payment callback with status '{}' for payment {}",
            request.status, request.payment_id
        );
        return Ok(Json(json!({ "acknowledged": true, "applied": false })));
    }

    let (appointment, applied) = state
        .engine
        .confirm_payment(request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "acknowledged": true,
        "applied": applied,
        "appointment_status": appointment.status
    })))
}
