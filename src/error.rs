use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message shared by every login failure so callers cannot tell which part was wrong.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("{}", LOGIN_FAILED_MESSAGE)]
    TenantNotFound(String),
    #[error("{}", LOGIN_FAILED_MESSAGE)]
    InvalidCredentials,
    #[error("No active session")]
    NoActiveSession,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Malformed time value: {0}")]
    MalformedTimeValue(String),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Mirror sync failed: {0}")]
    MirrorSync(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Migration(e) => {
                error!("Migration error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::TenantNotFound(_) | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, LOGIN_FAILED_MESSAGE.to_string())
            }
            AppError::NoActiveSession => (StatusCode::UNAUTHORIZED, "No active session".to_string()),
            AppError::InvalidConfiguration(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::MalformedTimeValue(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MirrorSync(msg) => {
                error!("Mirror sync error reached the API layer: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
