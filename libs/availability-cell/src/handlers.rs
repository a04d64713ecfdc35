// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::actor::{Actor, Role};
use shared_models::error::AppError;
use shared_store::MemoryStore;

use crate::models::{AvailabilityError, SaveAvailabilityRequest};
use crate::services::availability::AvailabilityService;

/// Shared state for the availability cell.
pub struct AvailabilityState {
    pub store: Arc<MemoryStore>,
}

fn map_error(e: AvailabilityError) -> AppError {
    match e {
        AvailabilityError::Validation(msg) => AppError::BadRequest(msg),
        AvailabilityError::UnsupportedTimezone(tz) => {
            AppError::BadRequest(format!("Unsupported timezone: {}", tz))
        }
        AvailabilityError::Storage(msg) => AppError::Internal(msg),
    }
}

/// Replace the calling doctor's full weekly availability.
#[axum::debug_handler]
pub async fn save_availability(
    State(state): State<Arc<AvailabilityState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<SaveAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if actor.role != Role::Doctor {
        return Err(AppError::Auth(
            "Only doctors may publish availability".to_string(),
        ));
    }

    let service = AvailabilityService::new(state.store.clone());
    let saved = service
        .save_week(actor.id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "slots": saved,
        "message": "Availability replaced"
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AvailabilityState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(state.store.clone());
    let slots = service.get_for_doctor(doctor_id).await;

    Ok(Json(json!({ "doctor_id": doctor_id, "slots": slots })))
}
