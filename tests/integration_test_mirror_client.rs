use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use booking_admin_core::domain::models::booking::PaymentMethod;
use booking_admin_core::domain::models::tenant::MirrorEndpoints;
use booking_admin_core::domain::ports::{MirrorClient, PaymentSyncPayload};
use booking_admin_core::error::AppError;
use booking_admin_core::infra::mirror::http_mirror_client::HttpMirrorClient;
use serde_json::Value;

#[derive(Clone, Default)]
struct Received {
    registered: Arc<Mutex<Vec<String>>>,
    synced: Arc<Mutex<Vec<Value>>>,
}

async fn register(State(received): State<Received>, Query(params): Query<HashMap<String, String>>) -> StatusCode {
    match params.get("bookingId") {
        Some(id) => {
            received.registered.lock().unwrap().push(id.clone());
            StatusCode::OK
        }
        None => StatusCode::BAD_REQUEST,
    }
}

async fn sync(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.synced.lock().unwrap().push(body);
    StatusCode::OK
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "sheet locked")
}

async fn slow() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn spawn_mirror() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/register", get(register))
        .route("/sync", post(sync))
        .route("/broken", get(broken).post(broken))
        .route("/slow", get(slow))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

fn payload(id: &str) -> PaymentSyncPayload {
    PaymentSyncPayload {
        booking_id: id.to_string(),
        payment_method: PaymentMethod::Card,
        payment_date: "10 December 2025".to_string(),
        method_only: false,
    }
}

#[tokio::test]
async fn test_register_and_sync_wire_format() {
    let (base, received) = spawn_mirror().await;
    let client = HttpMirrorClient::new(MirrorEndpoints {
        register_url: format!("{}/register", base),
        sync_url: format!("{}/sync", base),
    }, Duration::from_secs(2)).unwrap();

    client.register_booking("bk-42").await.unwrap();
    client.sync_payment(&payload("bk-42")).await.unwrap();

    assert_eq!(*received.registered.lock().unwrap(), vec!["bk-42".to_string()]);
    let synced = received.synced.lock().unwrap().clone();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0], serde_json::json!({
        "bookingId": "bk-42",
        "paymentMethod": "card",
        "paymentDate": "10 December 2025",
        "methodOnly": false
    }));
}

#[tokio::test]
async fn test_error_status_is_a_mirror_error() {
    let (base, _) = spawn_mirror().await;
    let client = HttpMirrorClient::new(MirrorEndpoints {
        register_url: format!("{}/broken", base),
        sync_url: format!("{}/broken", base),
    }, Duration::from_secs(2)).unwrap();

    assert!(matches!(client.register_booking("bk-1").await, Err(AppError::MirrorSync(_))));
    assert!(matches!(client.sync_payment(&payload("bk-1")).await, Err(AppError::MirrorSync(_))));
}

#[tokio::test]
async fn test_timeout_is_bounded() {
    let (base, _) = spawn_mirror().await;
    let client = HttpMirrorClient::new(MirrorEndpoints {
        register_url: format!("{}/slow", base),
        sync_url: format!("{}/slow", base),
    }, Duration::from_millis(200)).unwrap();

    let started = std::time::Instant::now();
    assert!(matches!(client.register_booking("bk-1").await, Err(AppError::MirrorSync(_))));
    assert!(started.elapsed() < Duration::from_secs(4));
}
