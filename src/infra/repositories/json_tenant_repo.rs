use std::collections::HashMap;
use std::path::Path;

use crate::domain::{models::tenant::TenantRecord, ports::TenantRepository};
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Tenant records loaded once from the deploy-time tenants file (a JSON array).
pub struct JsonTenantRepo {
    tenants: HashMap<String, TenantRecord>,
}

impl JsonTenantRepo {
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::InvalidConfiguration(format!("Cannot read tenants file {}: {}", path.display(), e))
        })?;
        let repo = Self::from_json(&raw)?;
        info!("Loaded {} tenant(s) from {}", repo.tenants.len(), path.display());
        Ok(repo)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let records: Vec<TenantRecord> = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidConfiguration(format!("Tenants file is not valid: {}", e)))?;
        Self::from_records(records)
    }

    /// Tenant ids are matched lower-cased; a repeated id is a configuration error.
    pub fn from_records(records: Vec<TenantRecord>) -> Result<Self, AppError> {
        let mut tenants = HashMap::with_capacity(records.len());
        for mut record in records {
            record.config.tenant_id = record.config.tenant_id.trim().to_lowercase();
            let tenant_id = record.config.tenant_id.clone();
            if tenants.insert(tenant_id.clone(), record).is_some() {
                return Err(AppError::InvalidConfiguration(format!("Tenant '{}' is configured twice", tenant_id)));
            }
        }
        Ok(Self { tenants })
    }
}

#[async_trait]
impl TenantRepository for JsonTenantRepo {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<TenantRecord>, AppError> {
        Ok(self.tenants.get(tenant_id).cloned())
    }
}
