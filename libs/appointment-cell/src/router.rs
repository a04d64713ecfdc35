// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::actor_middleware;

use crate::handlers::{self, EngineState};

pub fn appointment_routes(state: Arc<EngineState>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{id}", get(handlers::get_appointment))
        .route("/{id}/reschedule", post(handlers::reschedule_appointment))
        .route("/{id}/cancel", post(handlers::cancel_appointment))
        .route("/{id}/join", post(handlers::join_appointment))
        .route("/{id}/end", post(handlers::end_appointment))
        .route("/{id}/no-show", post(handlers::record_no_show))
        .layer(middleware::from_fn(actor_middleware));

    // Provider callbacks carry a shared secret instead of user identity.
    let webhook_routes =
        Router::new().route("/payments/confirm", post(handlers::confirm_payment_webhook));

    Router::new()
        .merge(protected_routes)
        .merge(webhook_routes)
        .with_state(state)
}
