use crate::domain::{models::client::Client, ports::{ClientRepository, StoreEvent}};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

const COLLECTION: &str = "users";

pub struct SqliteClientRepo {
    pool: SqlitePool,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteClientRepo {
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { pool, events }
    }

    fn notify(&self, id: &str) {
        let _ = self.events.send(StoreEvent { collection: COLLECTION, document_id: id.to_string() });
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepo {
    async fn list(&self) -> Result<Vec<Client>, AppError> {
        sqlx::query_as::<_, Client>("SELECT * FROM users ORDER BY first_seen_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Client not found".into())); }

        self.notify(id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
