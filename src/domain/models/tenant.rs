use serde::{Deserialize, Serialize};
use chrono_tz::Tz;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MirrorEndpoints {
    pub register_url: String,
    pub sync_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub database_url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub mirror: Option<MirrorEndpoints>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl ConnectionParams {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Immutable per-business configuration, created at deploy time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub display_name: String,
    pub connection_params: ConnectionParams,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenantCredential {
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenantRecord {
    #[serde(flatten)]
    pub config: TenantConfig,
    pub credential: TenantCredential,
}

/// Tenant id is the token before the first `_`, lower-cased.
pub fn tenant_id_from_username(username: &str) -> String {
    username.split('_').next().unwrap_or_default().to_lowercase()
}
