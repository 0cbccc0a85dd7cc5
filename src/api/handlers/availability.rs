use axum::{extract::{Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{BlockDateRequest, DayHoursRequest, SlotDurationRequest, SlotsQuery};
use crate::api::dtos::responses::{AvailabilityResponse, SlotResponse, SlotsResponse};
use crate::api::extractors::session::ActiveTenant;
use crate::domain::models::availability::{parse_calendar_date, parse_weekday};
use crate::domain::services::session_manager::ActiveSession;
use crate::error::AppError;
use tracing::info;

async fn current(session: &ActiveSession) -> AvailabilityResponse {
    let model = session.availability.snapshot().await;
    AvailabilityResponse::new(&model, session.availability.has_unsaved_changes())
}

pub async fn get_availability(ActiveTenant(session): ActiveTenant) -> Result<impl IntoResponse, AppError> {
    Ok(Json(current(&session).await))
}

pub async fn set_day_hours(
    ActiveTenant(session): ActiveTenant,
    Path(weekday): Path<String>,
    Json(payload): Json<DayHoursRequest>,
) -> Result<impl IntoResponse, AppError> {
    let weekday = parse_weekday(&weekday)?;
    session.availability
        .set_day_hours(weekday, payload.enabled, &payload.open_time, &payload.close_time)
        .await?;
    Ok(Json(current(&session).await))
}

pub async fn set_slot_duration(
    ActiveTenant(session): ActiveTenant,
    Json(payload): Json<SlotDurationRequest>,
) -> Result<impl IntoResponse, AppError> {
    session.availability.set_slot_duration(payload.minutes).await?;
    Ok(Json(current(&session).await))
}

pub async fn add_blocked_date(
    ActiveTenant(session): ActiveTenant,
    Json(payload): Json<BlockDateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_calendar_date(&payload.date)?;
    session.availability.add_blocked_date(date, payload.reason).await?;
    Ok(Json(current(&session).await))
}

pub async fn remove_blocked_date(
    ActiveTenant(session): ActiveTenant,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_calendar_date(&date)?;
    if !session.availability.remove_blocked_date(date).await? {
        return Err(AppError::NotFound(format!("{} is not blocked", date)));
    }
    Ok(Json(current(&session).await))
}

pub async fn save_availability(ActiveTenant(session): ActiveTenant) -> Result<impl IntoResponse, AppError> {
    session.availability.save().await?;
    info!(tenant_id = %session.tenant_id(), "Availability saved by operator");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_slots(
    ActiveTenant(session): ActiveTenant,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_calendar_date(&query.date)?;
    let slots = session.availability.compute_slots(date).await?;

    Ok(Json(SlotsResponse {
        date: date.format("%Y-%m-%d").to_string(),
        slots: slots.iter().map(SlotResponse::from).collect(),
    }))
}
