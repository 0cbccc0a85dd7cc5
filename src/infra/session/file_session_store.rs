use std::io::ErrorKind;
use std::path::PathBuf;

use crate::domain::ports::SessionStateStore;
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    current_tenant_id: Option<String>,
}

/// Persists the logged-in tenant id as `{"currentTenantId": "..."}`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> AppError {
        AppError::InternalWithMsg(format!("Cannot {} session state at {}: {}", action, self.path.display(), e))
    }
}

#[async_trait]
impl SessionStateStore for FileSessionStore {
    async fn load(&self) -> Result<Option<String>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", e)),
        };

        match serde_json::from_str::<SessionFile>(&raw) {
            Ok(file) => Ok(file.current_tenant_id.filter(|id| !id.trim().is_empty())),
            Err(e) => {
                warn!("Ignoring unreadable session state file: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, tenant_id: &str) -> Result<(), AppError> {
        let body = serde_json::to_string(&SessionFile { current_tenant_id: Some(tenant_id.to_string()) })
            .map_err(|e| AppError::InternalWithMsg(format!("Session state serialization failed: {}", e)))?;
        tokio::fs::write(&self.path, body).await.map_err(|e| self.io_error("write", e))
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("session_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let path = temp_path();
        let store = FileSessionStore::new(&path);

        assert_eq!(store.load().await.unwrap(), None);
        store.save("mexicuts").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("mexicuts".to_string()));

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw, r#"{"currentTenantId":"mexicuts"}"#);

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_no_session() {
        let path = temp_path();
        tokio::fs::write(&path, "not json").await.unwrap();
        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().await.unwrap(), None);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
