#![allow(dead_code)]

use booking_admin_core::{
    api::router::create_router,
    config::Config,
    domain::models::client::Client,
    domain::models::tenant::{ConnectionParams, MirrorEndpoints, TenantConfig, TenantCredential, TenantRecord},
    domain::ports::{BackendConnector, MirrorClient, PaymentSyncPayload, SessionStateStore, TenantConnection},
    domain::services::session_manager::ActiveSession,
    domain::services::tenant_directory::hash_password,
    error::AppError,
    infra::factory::{build_state, SqliteConnector},
    infra::repositories::json_tenant_repo::JsonTenantRepo,
    state::AppState,
};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;

pub const PASSWORD: &str = "Martina2016.";
pub const MIRROR_TENANT: &str = "mexicuts";
pub const PLAIN_TENANT: &str = "fadeco";
/// Configured tenant whose database can never be opened.
pub const BROKEN_TENANT: &str = "brokenco";

#[derive(Debug, Clone, PartialEq)]
pub enum MirrorCall {
    Register(String),
    Sync(PaymentSyncPayload),
}

#[derive(Default)]
pub struct MockMirror {
    pub fail_register: AtomicBool,
    pub fail_sync: AtomicBool,
    pub register_delay_ms: AtomicU64,
    calls: Mutex<Vec<MirrorCall>>,
}

impl MockMirror {
    pub fn calls(&self) -> Vec<MirrorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, MirrorCall::Register(_))).count()
    }

    pub fn sync_payloads(&self) -> Vec<PaymentSyncPayload> {
        self.calls().into_iter().filter_map(|c| match c {
            MirrorCall::Sync(payload) => Some(payload),
            _ => None,
        }).collect()
    }
}

#[async_trait]
impl MirrorClient for MockMirror {
    async fn register_booking(&self, booking_id: &str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(MirrorCall::Register(booking_id.to_string()));
        let delay = self.register_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(AppError::MirrorSync("register unavailable".into()));
        }
        Ok(())
    }

    async fn sync_payment(&self, payload: &PaymentSyncPayload) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(MirrorCall::Sync(payload.clone()));
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(AppError::MirrorSync("sync unavailable".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    current: Mutex<Option<String>>,
}

impl InMemorySessionStore {
    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    pub fn set(&self, tenant_id: Option<&str>) {
        *self.current.lock().unwrap() = tenant_id.map(str::to_string);
    }
}

#[async_trait]
impl SessionStateStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.current())
    }

    async fn save(&self, tenant_id: &str) -> Result<(), AppError> {
        self.set(Some(tenant_id));
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.set(None);
        Ok(())
    }
}

/// Real SQLite connections, with the mock mirror swapped in and every connect counted.
pub struct TestConnector {
    inner: SqliteConnector,
    pub mirror: Arc<MockMirror>,
    pub connects: AtomicUsize,
    pub connect_delay: Duration,
}

impl TestConnector {
    pub fn new(mirror: Arc<MockMirror>) -> Self {
        Self {
            inner: SqliteConnector::new(Duration::from_secs(1), Duration::from_millis(100)),
            mirror,
            connects: AtomicUsize::new(0),
            connect_delay: Duration::ZERO,
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for TestConnector {
    async fn connect(&self, tenant: &TenantConfig) -> Result<TenantConnection, AppError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let mut connection = self.inner.connect(tenant).await?;
        if connection.mirror.is_some() {
            connection.mirror = Some(self.mirror.clone() as Arc<dyn MirrorClient>);
        }
        Ok(connection)
    }
}

pub fn tenant_record(tenant_id: &str, username: &str, database_url: &str, with_mirror: bool) -> TenantRecord {
    TenantRecord {
        config: TenantConfig {
            tenant_id: tenant_id.to_string(),
            display_name: tenant_id.to_uppercase(),
            connection_params: ConnectionParams {
                database_url: database_url.to_string(),
                timezone: "UTC".to_string(),
                mirror: with_mirror.then(|| MirrorEndpoints {
                    register_url: "http://127.0.0.1:9/register".to_string(),
                    sync_url: "http://127.0.0.1:9/sync".to_string(),
                }),
            },
        },
        credential: TenantCredential {
            username: username.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
        },
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        tenants_file: "unused".to_string(),
        session_state_path: "unused".to_string(),
        mirror_timeout: Duration::from_secs(1),
        change_poll_interval: Duration::from_millis(100),
        log_dir: "./logs".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mirror: Arc<MockMirror>,
    pub connector: Arc<TestConnector>,
    pub session_store: Arc<InMemorySessionStore>,
    db_prefix: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_connector(|connector| connector).await
    }

    pub async fn with_connector(configure: impl FnOnce(TestConnector) -> TestConnector) -> Self {
        let db_prefix = format!("test_{}", Uuid::new_v4());
        let records = vec![
            tenant_record(MIRROR_TENANT, "mexicuts_admin", &Self::db_url_for(&db_prefix, MIRROR_TENANT), true),
            tenant_record(PLAIN_TENANT, "fadeco_owner", &Self::db_url_for(&db_prefix, PLAIN_TENANT), false),
            tenant_record(BROKEN_TENANT, "brokenco_admin", "sqlite:///definitely/not/a/dir/brokenco.db", false),
        ];
        let tenant_repo = Arc::new(JsonTenantRepo::from_records(records).unwrap());

        let mirror = Arc::new(MockMirror::default());
        let connector = Arc::new(configure(TestConnector::new(mirror.clone())));
        let session_store = Arc::new(InMemorySessionStore::default());

        let state = Arc::new(build_state(test_config(), tenant_repo, connector.clone(), session_store.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            state,
            mirror,
            connector,
            session_store,
            db_prefix,
        }
    }

    fn db_url_for(prefix: &str, tenant_id: &str) -> String {
        format!("sqlite://{}_{}.db?mode=rwc", prefix, tenant_id)
    }

    pub fn db_url(&self, tenant_id: &str) -> String {
        Self::db_url_for(&self.db_prefix, tenant_id)
    }

    /// A pool of its own on the tenant database, standing in for writers outside this process.
    pub async fn raw_pool(&self, tenant_id: &str) -> SqlitePool {
        let opts = SqliteConnectOptions::from_str(&self.db_url(tenant_id)).unwrap();
        SqlitePoolOptions::new().max_connections(1).connect_with(opts).await.unwrap()
    }

    /// Registers a client the way the booking channel does, straight into `users`.
    pub async fn seed_client(&self, tenant_id: &str, name: &str, phone: &str) -> Client {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            first_seen_at: Utc::now(),
            visit_count: 0,
        };
        sqlx::query("INSERT INTO users (id, name, phone, first_seen_at, visit_count) VALUES (?, ?, ?, ?, ?)")
            .bind(&client.id).bind(&client.name).bind(&client.phone).bind(client.first_seen_at).bind(client.visit_count)
            .execute(&self.raw_pool(tenant_id).await).await.unwrap();
        client
    }

    pub async fn login(&self) -> Arc<ActiveSession> {
        self.state.sessions.login("mexicuts_admin", PASSWORD).await.expect("login failed in test helper")
    }

    pub async fn login_plain(&self) -> Arc<ActiveSession> {
        self.state.sessions.login("fadeco_owner", PASSWORD).await.expect("login failed in test helper")
    }

    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for tenant_id in [MIRROR_TENANT, PLAIN_TENANT] {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}_{}.db{}", self.db_prefix, tenant_id, suffix));
            }
        }
    }
}
