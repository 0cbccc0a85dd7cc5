use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::services::session_manager::ActiveSession;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// The logged-in tenant's session; rejects with `NoActiveSession` (401) otherwise.
pub struct ActiveTenant(pub Arc<ActiveSession>);

impl<S> FromRequestParts<S> for ActiveTenant
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let session = app_state.sessions.active().await?;

        Span::current().record("tenant_id", session.tenant_id());

        Ok(ActiveTenant(session))
    }
}
