use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, session, availability, booking, payment, client};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Session
        .route("/api/v1/session", get(session::current_session))
        .route("/api/v1/session/login", post(session::login))
        .route("/api/v1/session/logout", post(session::logout))

        // Availability
        .route("/api/v1/availability", get(availability::get_availability))
        .route("/api/v1/availability/days/{weekday}", put(availability::set_day_hours))
        .route("/api/v1/availability/slot-duration", put(availability::set_slot_duration))
        .route("/api/v1/availability/blocked-dates", post(availability::add_blocked_date))
        .route("/api/v1/availability/blocked-dates/{date}", delete(availability::remove_blocked_date))
        .route("/api/v1/availability/save", post(availability::save_availability))
        .route("/api/v1/availability/slots", get(availability::get_slots))

        // Bookings
        .route("/api/v1/bookings", get(booking::list_bookings).post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking).patch(booking::update_booking).delete(booking::delete_booking))

        // Payments
        .route("/api/v1/bookings/{booking_id}/payment-method", put(payment::set_payment_method))
        .route("/api/v1/bookings/{booking_id}/confirm-payment", post(payment::confirm_payment))
        .route("/api/v1/bookings/{booking_id}/dismiss-pending", post(payment::dismiss_pending))

        // Clients
        .route("/api/v1/clients", get(client::list_clients))
        .route("/api/v1/clients/stats", get(client::client_stats))
        .route("/api/v1/clients/{client_id}", delete(client::delete_client))
        .route("/api/v1/clients/{client_id}/bookings", get(client::client_bookings))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
