use crate::domain::{models::availability::AvailabilityDocument, ports::{AvailabilityRepository, StoreEvent}};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::error;

const COLLECTION: &str = "settings";
const AVAILABILITY_KEY: &str = "availability";
const MERGED_FIELDS: [&str; 3] = ["businessHours", "blockedDates", "slotDuration"];

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { pool, events }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn load(&self) -> Result<Option<AvailabilityDocument>, AppError> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(AVAILABILITY_KEY)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        let Some(raw) = raw else { return Ok(None) };
        match serde_json::from_str::<AvailabilityDocument>(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                error!("Stored availability document is unreadable, falling back to defaults: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, document: &AvailabilityDocument) -> Result<(), AppError> {
        let incoming = serde_json::to_value(document)
            .map_err(|e| AppError::InternalWithMsg(format!("Availability serialization failed: {}", e)))?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let existing: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(AVAILABILITY_KEY)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        // Keys owned by other writers are carried over untouched.
        let mut merged = existing
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_else(Map::new);

        for field in MERGED_FIELDS {
            if let Some(value) = incoming.get(field) {
                merged.insert(field.to_string(), value.clone());
            }
        }

        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"
        )
            .bind(AVAILABILITY_KEY).bind(Value::Object(merged).to_string()).bind(Utc::now())
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        let _ = self.events.send(StoreEvent { collection: COLLECTION, document_id: AVAILABILITY_KEY.to_string() });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
