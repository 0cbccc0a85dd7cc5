use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let active = state.sessions.active().await.ok();
    let cached_connections = state.sessions.router().registry().tenant_ids().await;
    Json(json!({
        "status": "ok",
        "active_tenant": active.as_ref().map(|s| s.tenant_id().to_string()),
        "live_sync": active.as_ref().is_some_and(|s| s.is_live()),
        "cached_connections": cached_connections,
    }))
}
