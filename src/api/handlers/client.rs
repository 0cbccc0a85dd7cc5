use axum::{extract::{Path, Query}, http::StatusCode, response::{IntoResponse, Response}, Json};
use chrono::Utc;
use crate::api::dtos::requests::ClientListQuery;
use crate::api::extractors::session::ActiveTenant;
use crate::domain::services::client_directory::bookings_for;
use crate::error::AppError;

pub async fn list_clients(
    ActiveTenant(session): ActiveTenant,
    Query(query): Query<ClientListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let clients = session.clients.list(query.search.as_deref(), query.sort.unwrap_or_default());
    Ok(Json(clients))
}

pub async fn client_stats(ActiveTenant(session): ActiveTenant) -> Result<impl IntoResponse, AppError> {
    Ok(Json(session.clients.stats(Utc::now())))
}

pub async fn client_bookings(
    ActiveTenant(session): ActiveTenant,
    Path(client_id): Path<String>,
) -> Result<Response, AppError> {
    let client = session.clients.find(&client_id)
        .ok_or(AppError::NotFound("Client not found".into()))?;

    let snapshot = session.bookings.snapshot();
    let linked = bookings_for(&client, &snapshot.all());
    Ok(Json(linked).into_response())
}

pub async fn delete_client(
    ActiveTenant(session): ActiveTenant,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    session.clients.delete(&client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
