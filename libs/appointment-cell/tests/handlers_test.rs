// libs/appointment-cell/tests/handlers_test.rs
//
// Boundary tests for the appointment routes: identity headers, the webhook
// shared secret, and the JSON envelope.
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::handlers::EngineState;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::engine::SchedulingEngine;
use notification_cell::services::dispatcher::NotificationDispatcher;
use shared_config::AppConfig;
use shared_models::records::{AvailabilitySlot, Doctor, Patient, SpecialtyService};
use shared_store::{MemoryStore, StorageError};
use shared_utils::clock::FixedClock;
use video_session_cell::services::token::VideoTokenService;

struct Ids {
    patient: Uuid,
    doctor: Uuid,
    specialty: Uuid,
}

fn config() -> AppConfig {
    AppConfig {
        payment_webhook_secret: "hook-secret".to_string(),
        video_signing_key: "signing-key".to_string(),
        video_token_ttl_minutes: 120,
        whatsapp_api_url: String::new(),
        whatsapp_api_token: String::new(),
    }
}

async fn test_app() -> (axum::Router, Ids) {
    let store = Arc::new(MemoryStore::new());
    // Saturday; the seeded window is Monday 09:00-12:00 UTC.
    let clock = Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2025, 5, 31, 10, 0, 0).unwrap(),
    ));

    let ids = Ids {
        patient: Uuid::new_v4(),
        doctor: Uuid::new_v4(),
        specialty: Uuid::new_v4(),
    };

    store
        .transaction::<_, StorageError, _>(|tx| {
            tx.patients.insert(
                ids.patient,
                Patient {
                    id: ids.patient,
                    display_name: "Nour".to_string(),
                    country: "US".to_string(),
                },
            );
            tx.doctors.insert(
                ids.doctor,
                Doctor {
                    id: ids.doctor,
                    display_name: "Dr. Salem".to_string(),
                    commission_pct: 70.0,
                    is_active: true,
                },
            );
            tx.services.insert(
                ids.specialty,
                SpecialtyService {
                    id: ids.specialty,
                    name: "Cardiology second opinion".to_string(),
                    base_price: 150.0,
                    prices_by_currency: HashMap::from([("USD".to_string(), 150.0)]),
                },
            );
            tx.availability.push(AvailabilitySlot {
                id: Uuid::new_v4(),
                doctor_id: ids.doctor,
                day_of_week: 1,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                timezone: "UTC".to_string(),
                active: true,
            });
            Ok(())
        })
        .await
        .unwrap();

    let engine = SchedulingEngine::new(
        store,
        clock,
        Some(VideoTokenService::new(&config()).unwrap()),
        NotificationDispatcher::disabled(),
    );

    let state = Arc::new(EngineState {
        engine,
        config: config(),
    });

    (appointment_routes(state), ids)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_requires_identity_headers() {
    let (app, ids) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "patient_id": ids.patient,
                "doctor_id": ids.doctor,
                "specialty_id": ids.specialty,
                "order_id": null,
                "scheduled_at": "2025-06-02T10:00:00Z"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_via_http_returns_the_appointment() {
    let (app, ids) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-user-id", ids.patient.to_string())
        .header("x-user-role", "patient")
        .body(Body::from(
            json!({
                "patient_id": ids.patient,
                "doctor_id": ids.doctor,
                "specialty_id": ids.specialty,
                "order_id": null,
                "scheduled_at": "2025-06-02T10:00:00Z"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("pending"));
    assert_eq!(body["appointment"]["currency"], json!("USD"));
    assert_eq!(body["appointment"]["price"], json!(150.0));
}

#[tokio::test]
async fn webhook_rejects_a_wrong_secret() {
    let (app, _ids) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/payments/confirm")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "not-the-secret")
        .body(Body::from(
            json!({
                "payment_id": Uuid::new_v4(),
                "status": "paid",
                "reference": null,
                "method": null
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_acknowledges_unknown_statuses_without_action() {
    let (app, _ids) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/payments/confirm")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "hook-secret")
        .body(Body::from(
            json!({
                "payment_id": Uuid::new_v4(),
                "status": "failed",
                "reference": null,
                "method": null
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["acknowledged"], json!(true));
    assert_eq!(body["applied"], json!(false));
}

#[tokio::test]
async fn policy_rejections_surface_the_code() {
    let (app, ids) = test_app().await;

    // Tuesday is outside the doctor's published window.
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-user-id", ids.patient.to_string())
        .header("x-user-role", "patient")
        .body(Body::from(
            json!({
                "patient_id": ids.patient,
                "doctor_id": ids.doctor,
                "specialty_id": ids.specialty,
                "order_id": null,
                "scheduled_at": "2025-06-03T10:00:00Z"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["code"], json!("outside_availability"));
}
