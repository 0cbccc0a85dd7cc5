use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub tenants_file: String,
    pub session_state_path: String,
    pub mirror_timeout: Duration,
    /// How often each tenant store is checked for commits made outside this process.
    pub change_poll_interval: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("PORT must be a number".into()))?;
        let mirror_timeout_secs: u64 = env::var("MIRROR_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| AppError::Validation("MIRROR_TIMEOUT_SECS must be a number".into()))?;
        let change_poll_ms: u64 = env::var("CHANGE_POLL_MS").unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("CHANGE_POLL_MS must be a number".into()))?;
        if change_poll_ms == 0 {
            return Err(AppError::Validation("CHANGE_POLL_MS must be positive".into()));
        }

        Ok(Self {
            port,
            tenants_file: env::var("TENANTS_FILE").unwrap_or_else(|_| "./tenants.json".to_string()),
            session_state_path: env::var("SESSION_STATE_PATH").unwrap_or_else(|_| "./session.json".to_string()),
            mirror_timeout: Duration::from_secs(mirror_timeout_secs),
            change_poll_interval: Duration::from_millis(change_poll_ms),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        })
    }
}
