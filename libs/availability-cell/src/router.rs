// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, AvailabilityState};

pub fn availability_routes(state: Arc<AvailabilityState>) -> Router {
    let protected_routes = Router::new()
        .route("/", put(handlers::save_availability))
        .route("/{doctor_id}", get(handlers::get_doctor_availability))
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
