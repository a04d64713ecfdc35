// apps/api/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use appointment_cell::handlers::EngineState;
use appointment_cell::router::appointment_routes;
use availability_cell::handlers::AvailabilityState;
use availability_cell::router::availability_routes;

pub fn create_router(
    availability_state: Arc<AvailabilityState>,
    engine_state: Arc<EngineState>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/availability", availability_routes(availability_state))
        .nest("/appointments", appointment_routes(engine_state))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
