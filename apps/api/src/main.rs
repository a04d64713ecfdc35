// apps/api/src/main.rs
use std::sync::Arc;

use dotenv::dotenv;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::handlers::EngineState;
use appointment_cell::services::engine::SchedulingEngine;
use availability_cell::handlers::AvailabilityState;
use notification_cell::services::dispatcher::{
    InternalChannel, NotificationChannel, NotificationDispatcher,
};
use notification_cell::services::whatsapp::WhatsAppChannel;
use shared_config::AppConfig;
use shared_store::MemoryStore;
use shared_utils::clock::SystemClock;
use video_session_cell::services::token::VideoTokenService;

mod router;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "second_opinion_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting second opinion API");

    let config = AppConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(SystemClock);

    let video = match VideoTokenService::new(&config) {
        Ok(service) => Some(service),
        Err(e) => {
            warn!("Video conferencing disabled: {}", e);
            None
        }
    };

    let mut channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(InternalChannel)];
    match WhatsAppChannel::from_config(&config) {
        Some(channel) => channels.push(Arc::new(channel)),
        None => warn!("WhatsApp notifications disabled: provider not configured"),
    }
    let notifier = NotificationDispatcher::new(channels);

    let engine = SchedulingEngine::new(store.clone(), clock, video, notifier);

    let availability_state = Arc::new(AvailabilityState {
        store: store.clone(),
    });
    let engine_state = Arc::new(EngineState {
        engine,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(availability_state, engine_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("failed to bind 0.0.0.0:3000");
    info!("Listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.expect("server error");
}
