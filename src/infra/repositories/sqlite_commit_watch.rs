use crate::domain::ports::CommitWatch;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use tokio::sync::Mutex;
use tracing::log::LevelFilter;

/// Reads `PRAGMA data_version` on a connection of its own. The pragma only moves for commits
/// made by other connections, so it has to be the same connection on every read.
pub struct SqliteCommitWatch {
    conn: Mutex<SqliteConnection>,
}

impl SqliteCommitWatch {
    pub async fn connect(opts: &SqliteConnectOptions) -> Result<Self, AppError> {
        let conn = opts.clone().log_statements(LevelFilter::Trace).connect().await?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl CommitWatch for SqliteCommitWatch {
    async fn data_version(&self) -> Result<i64, AppError> {
        let mut conn = self.conn.lock().await;
        sqlx::query_scalar::<_, i64>("PRAGMA data_version")
            .fetch_one(&mut *conn)
            .await
            .map_err(AppError::Database)
    }
}
