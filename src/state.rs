use std::sync::Arc;
use crate::config::Config;
use crate::domain::services::session_manager::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionManager>,
}
