use axum::{extract::Path, response::IntoResponse, Json};
use crate::api::dtos::requests::{ConfirmPaymentRequest, PaymentMethodRequest};
use crate::api::dtos::responses::PaymentConfirmedResponse;
use crate::api::extractors::session::ActiveTenant;
use crate::error::AppError;

pub async fn set_payment_method(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
    Json(payload): Json<PaymentMethodRequest>,
) -> Result<impl IntoResponse, AppError> {
    match payload.method {
        Some(method) => session.payments.choose_method(&booking_id, method).await?,
        None => session.payments.clear_method(&booking_id).await?,
    }

    let booking = session.bookings.get(&booking_id).await?;
    Ok(Json(booking))
}

pub async fn confirm_payment(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    // The mirror sync keeps running after the response is sent.
    let confirmation = session.payments.confirm(&booking_id, payload.method).await?;

    Ok(Json(PaymentConfirmedResponse {
        id: booking_id,
        registered_with_mirror: confirmation.registered_with_mirror,
    }))
}

pub async fn dismiss_pending(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    session.payments.remove_from_pending(&booking_id).await?;
    let booking = session.bookings.get(&booking_id).await?;
    Ok(Json(booking))
}
