use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::models::tenant::TenantConfig;
use crate::domain::ports::{BackendConnector, TenantConnection};
use crate::error::AppError;

/// Cache of live tenant connections keyed by tenant id.
///
/// Connections are built at most once per tenant for the lifetime of the registry; the mutex
/// covers lookup and insert together so racing activations share one connection.
pub struct ConnectionRegistry {
    connector: Arc<dyn BackendConnector>,
    connections: Mutex<HashMap<String, Arc<TenantConnection>>>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            connector,
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_connect(&self, tenant: &TenantConfig) -> Result<Arc<TenantConnection>, AppError> {
        let mut connections = self.connections.lock().await;

        if let Some(existing) = connections.get(&tenant.tenant_id) {
            info!(tenant_id = %tenant.tenant_id, "Reusing cached tenant connection");
            return Ok(existing.clone());
        }

        let connection = Arc::new(self.connector.connect(tenant).await?);
        connections.insert(tenant.tenant_id.clone(), connection.clone());
        info!(tenant_id = %tenant.tenant_id, "Tenant connection established");
        Ok(connection)
    }

    /// Tenants with a cached connection, sorted.
    pub async fn tenant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connections.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[derive(Clone)]
pub enum RouterState {
    NoSession,
    Connecting(String),
    Active(Arc<TenantConnection>),
}

pub struct TenantConnectionRouter {
    registry: Arc<ConnectionRegistry>,
    state: RwLock<RouterState>,
}

impl TenantConnectionRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            state: RwLock::new(RouterState::NoSession),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub async fn activate(&self, tenant: &TenantConfig) -> Result<Arc<TenantConnection>, AppError> {
        self.set_state(RouterState::Connecting(tenant.tenant_id.clone()));

        match self.registry.get_or_connect(tenant).await {
            Ok(connection) => {
                self.set_state(RouterState::Active(connection.clone()));
                Ok(connection)
            }
            Err(e) => {
                warn!(tenant_id = %tenant.tenant_id, "Tenant activation failed: {}", e);
                self.set_state(RouterState::NoSession);
                Err(e)
            }
        }
    }

    pub fn current(&self) -> Option<Arc<TenantConnection>> {
        match self.state() {
            RouterState::Active(connection) => Some(connection),
            _ => None,
        }
    }

    /// Clears the active marker; the cached connection stays in the registry.
    pub fn deactivate(&self) {
        self.set_state(RouterState::NoSession);
    }

    /// Points the marker back at `current` after a failed switch.
    pub fn reset_to(&self, current: Option<Arc<TenantConnection>>) {
        self.set_state(match current {
            Some(connection) => RouterState::Active(connection),
            None => RouterState::NoSession,
        });
    }

    pub fn state(&self) -> RouterState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_state(&self, next: RouterState) {
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                *guard = next;
            }
        }
    }
}
