use axum::{extract::{Path, Query}, http::StatusCode, response::{IntoResponse, Response}, Json};
use crate::api::dtos::requests::{BookingListQuery, BookingView, CreateBookingRequest, UpdateBookingRequest};
use crate::api::dtos::responses::{BookingListResponse, CreatedResponse};
use crate::api::extractors::session::ActiveTenant;
use crate::domain::models::availability::{parse_calendar_date, TimeSlot};
use crate::domain::models::booking::{BookingPatch, NewBooking};
use crate::error::AppError;

pub async fn list_bookings(
    ActiveTenant(session): ActiveTenant,
    Query(query): Query<BookingListQuery>,
) -> Result<Response, AppError> {
    let snapshot = session.bookings.snapshot();
    let now = session.bookings.now();

    let mut bookings = match query.view.unwrap_or_default() {
        BookingView::All => snapshot.all(),
        BookingView::Upcoming => snapshot.upcoming(now),
        BookingView::Past => snapshot.past(now),
        BookingView::Pending => snapshot.pending_payments(now),
        BookingView::Completed => snapshot.completed_payments(),
    };

    if let Some(raw) = &query.date {
        let date = parse_calendar_date(raw)?;
        bookings.retain(|b| b.starts_at.date() == date);
    }

    Ok(Json(BookingListResponse {
        bookings,
        rejected_records: snapshot.rejected.len(),
    }).into_response())
}

pub async fn get_booking(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = session.bookings.get(&booking_id).await?;
    Ok(Json(booking))
}

pub async fn create_booking(
    ActiveTenant(session): ActiveTenant,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let slot = TimeSlot::parse(&payload.time_slot)?;

    let id = session.bookings.create(NewBooking {
        customer_name: payload.customer_name.trim().to_string(),
        customer_phone: payload.customer_phone.trim().to_string(),
        slot,
        notes: payload.notes,
        customer_ref: payload.customer_ref,
    }).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn update_booking(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let time_slot = payload.time_slot.as_deref().map(TimeSlot::parse).transpose()?;

    let patch = BookingPatch {
        customer_name: payload.customer_name.map(|n| n.trim().to_string()),
        customer_phone: payload.customer_phone.map(|p| p.trim().to_string()),
        time_slot,
        notes: payload.notes,
        customer_ref: payload.customer_ref,
        ..Default::default()
    };

    session.bookings.update(&booking_id, patch).await?;
    let updated = session.bookings.get(&booking_id).await?;
    Ok(Json(updated))
}

pub async fn delete_booking(
    ActiveTenant(session): ActiveTenant,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    session.bookings.delete(&booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
