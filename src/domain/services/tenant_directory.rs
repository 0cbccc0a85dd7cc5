use std::sync::{Arc, LazyLock};

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{error, info, warn};

use crate::domain::models::tenant::{tenant_id_from_username, TenantConfig, TenantCredential};
use crate::domain::ports::TenantRepository;
use crate::error::AppError;

pub struct TenantDirectory {
    repo: Arc<dyn TenantRepository>,
}

impl TenantDirectory {
    pub fn new(repo: Arc<dyn TenantRepository>) -> Self {
        Self { repo }
    }

    /// Maps operator credentials to their tenant.
    ///
    /// `TenantNotFound` and `InvalidCredentials` render identically; only logs can tell them apart.
    pub async fn resolve(&self, username: &str, password: &str) -> Result<TenantConfig, AppError> {
        let username = username.trim();
        let tenant_id = tenant_id_from_username(username);

        let record = match self.repo.find_by_id(&tenant_id).await? {
            Some(record) => record,
            None => {
                verify_against_placeholder(password);
                warn!(tenant_id = %tenant_id, "Login rejected: no tenant configuration");
                return Err(AppError::TenantNotFound(tenant_id));
            }
        };

        if !credential_matches(&record.credential, username, password) {
            warn!(tenant_id = %tenant_id, "Login rejected: credential mismatch");
            return Err(AppError::InvalidCredentials);
        }

        info!(tenant_id = %tenant_id, "Credentials accepted for {}", record.config.display_name);
        Ok(record.config)
    }

    pub async fn config_for(&self, tenant_id: &str) -> Result<Option<TenantConfig>, AppError> {
        Ok(self.repo.find_by_id(tenant_id).await?.map(|record| record.config))
    }
}

// Both halves are always evaluated so the outcome is one combined check.
fn credential_matches(credential: &TenantCredential, username: &str, password: &str) -> bool {
    let username_ok = credential.username == username;

    let password_ok = match PasswordHash::new(&credential.password_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            error!("Stored credential hash is unreadable: {}", e);
            false
        }
    };

    username_ok & password_ok
}

static PLACEHOLDER_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("placeholder-credential").ok());

/// Spends one argon2 verification on an unknown tenant, so response time does not reveal
/// which tenant ids exist. Returns whether a verification actually ran.
fn verify_against_placeholder(password: &str) -> bool {
    if let Some(hash) = PLACEHOLDER_HASH.as_deref()
        && let Ok(parsed) = PasswordHash::new(hash) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
        return true;
    }
    error!("Placeholder credential hash unavailable");
    false
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalWithMsg(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}
