use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono_tz::Tz;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::models::tenant::TenantConfig;
use crate::domain::ports::{
    BackendConnector, ExternalChanges, MirrorClient, SessionStateStore, TenantConnection, TenantRepository,
};
use crate::domain::services::{
    connection_router::{ConnectionRegistry, TenantConnectionRouter},
    session_manager::SessionManager,
    tenant_directory::TenantDirectory,
};
use crate::error::AppError;
use crate::infra::mirror::http_mirror_client::HttpMirrorClient;
use crate::infra::repositories::{
    json_tenant_repo::JsonTenantRepo, sqlite_availability_repo::SqliteAvailabilityRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_client_repo::SqliteClientRepo,
    sqlite_commit_watch::SqliteCommitWatch,
};
use crate::infra::session::file_session_store::FileSessionStore;
use crate::state::AppState;

/// Opens one SQLite pool per tenant, plus its mirror client when endpoints are configured.
pub struct SqliteConnector {
    mirror_timeout: Duration,
    change_poll_interval: Duration,
}

impl SqliteConnector {
    pub fn new(mirror_timeout: Duration, change_poll_interval: Duration) -> Self {
        Self { mirror_timeout, change_poll_interval }
    }
}

#[async_trait]
impl BackendConnector for SqliteConnector {
    async fn connect(&self, tenant: &TenantConfig) -> Result<TenantConnection, AppError> {
        let params = &tenant.connection_params;
        info!(tenant_id = %tenant.tenant_id, "Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(&params.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts.clone())
            .await?;

        run_sqlite_migrations(&pool).await?;

        let external_changes = match SqliteCommitWatch::connect(&opts).await {
            Ok(watch) => Some(ExternalChanges { watch: Arc::new(watch), interval: self.change_poll_interval }),
            Err(e) => {
                warn!(tenant_id = %tenant.tenant_id, "Commit watch unavailable, only local writes will refresh views: {}", e);
                None
            }
        };

        if params.timezone.parse::<Tz>().is_err() {
            warn!(tenant_id = %tenant.tenant_id, "Unknown timezone '{}', using UTC", params.timezone);
        }

        let mirror: Option<Arc<dyn MirrorClient>> = match &params.mirror {
            Some(endpoints) => Some(Arc::new(HttpMirrorClient::new(endpoints.clone(), self.mirror_timeout)?)),
            None => {
                info!(tenant_id = %tenant.tenant_id, "No mirror endpoints configured");
                None
            }
        };

        Ok(TenantConnection {
            tenant: tenant.clone(),
            tz: params.tz(),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            clients: Arc::new(SqliteClientRepo::new(pool.clone())),
            availability: Arc::new(SqliteAvailabilityRepo::new(pool)),
            mirror,
            external_changes,
        })
    }
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let tenant_repo = Arc::new(JsonTenantRepo::from_path(&config.tenants_file).await?);
    let connector = Arc::new(SqliteConnector::new(config.mirror_timeout, config.change_poll_interval));
    let session_store = Arc::new(FileSessionStore::new(&config.session_state_path));

    Ok(build_state(config.clone(), tenant_repo, connector, session_store))
}

pub fn build_state(
    config: Config,
    tenant_repo: Arc<dyn TenantRepository>,
    connector: Arc<dyn BackendConnector>,
    session_store: Arc<dyn SessionStateStore>,
) -> AppState {
    let directory = TenantDirectory::new(tenant_repo);
    let router = TenantConnectionRouter::new(Arc::new(ConnectionRegistry::new(connector)));

    AppState {
        config,
        sessions: Arc::new(SessionManager::new(directory, router, session_store)),
    }
}

async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await?;
    Ok(())
}
