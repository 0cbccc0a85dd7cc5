use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::LoginRequest;
use crate::api::dtos::responses::SessionResponse;
use crate::api::extractors::session::ActiveTenant;
use crate::error::AppError;
use std::sync::Arc;

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.login(&payload.username, &payload.password).await?;
    Ok(Json(SessionResponse::from_session(&session)))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    state.sessions.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(ActiveTenant(session): ActiveTenant) -> Result<impl IntoResponse, AppError> {
    Ok(Json(SessionResponse::from_session(&session)))
}
