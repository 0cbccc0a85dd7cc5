use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::domain::models::tenant::TenantConfig;
use crate::domain::ports::{SessionStateStore, TenantConnection};
use crate::domain::services::{
    availability::AvailabilityService,
    booking_store::BookingStore,
    client_directory::ClientDirectory,
    connection_router::TenantConnectionRouter,
    live_sync::{spawn_commit_watch, ListenerHandle},
    payment_reconciler::PaymentReconciler,
    tenant_directory::TenantDirectory,
};
use crate::error::AppError;

/// Domain state for the logged-in tenant.
pub struct ActiveSession {
    pub tenant: TenantConfig,
    pub connection: Arc<TenantConnection>,
    pub bookings: Arc<BookingStore>,
    pub availability: Arc<AvailabilityService>,
    pub clients: Arc<ClientDirectory>,
    pub payments: PaymentReconciler,
    listeners: StdMutex<Vec<ListenerHandle>>,
}

impl ActiveSession {
    async fn start(connection: Arc<TenantConnection>) -> Result<Arc<Self>, AppError> {
        let bookings = Arc::new(BookingStore::new(connection.bookings.clone(), connection.tz));
        let availability = Arc::new(AvailabilityService::new(connection.availability.clone()));
        let clients = Arc::new(ClientDirectory::new(connection.clients.clone()));
        let payments = PaymentReconciler::new(
            connection.tenant.tenant_id.clone(),
            bookings.clone(),
            connection.mirror.clone(),
            connection.tz,
        );

        // Read before the initial loads so a commit landing during them still triggers a refresh.
        let baseline = match &connection.external_changes {
            Some(changes) => changes.watch.data_version().await.ok(),
            None => None,
        };

        let mut listeners = vec![
            bookings.start().await?,
            availability.start().await?,
            clients.start().await?,
        ];

        if let Some(changes) = &connection.external_changes {
            let (bookings, availability, clients) = (bookings.clone(), availability.clone(), clients.clone());
            listeners.push(spawn_commit_watch(changes.watch.clone(), changes.interval, baseline, move || {
                let (bookings, availability, clients) = (bookings.clone(), availability.clone(), clients.clone());
                async move {
                    if let Err(e) = bookings.refresh().await {
                        warn!("Booking refresh after external commit failed: {}", e);
                    }
                    if let Err(e) = clients.refresh().await {
                        warn!("Client refresh after external commit failed: {}", e);
                    }
                    availability.refresh_from_store().await;
                }
            }));
        }

        Ok(Arc::new(Self {
            tenant: connection.tenant.clone(),
            connection,
            bookings,
            availability,
            clients,
            payments,
            listeners: StdMutex::new(listeners),
        }))
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant.tenant_id
    }

    /// True while at least one change listener is still running.
    pub fn is_live(&self) -> bool {
        self.listener_count() > 0
    }

    fn listener_count(&self) -> usize {
        match self.listeners.lock() {
            Ok(listeners) => listeners.iter().filter(|l| !l.is_finished()).count(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Stops live sync. Handlers still holding the session keep a frozen snapshot.
    fn shutdown(&self) {
        let drained = match self.listeners.lock() {
            Ok(mut listeners) => std::mem::take(&mut *listeners),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        drop(drained);
    }
}

/// Process-wide login state: at most one tenant is active at a time.
pub struct SessionManager {
    directory: TenantDirectory,
    router: TenantConnectionRouter,
    state_store: Arc<dyn SessionStateStore>,
    active: RwLock<Option<Arc<ActiveSession>>>,
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(directory: TenantDirectory, router: TenantConnectionRouter, state_store: Arc<dyn SessionStateStore>) -> Self {
        Self {
            directory,
            router,
            state_store,
            active: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    pub fn router(&self) -> &TenantConnectionRouter {
        &self.router
    }

    /// Switches to the tenant behind `username`. The current session keeps running until the
    /// new one has started, so a failed switch leaves it (and the persisted state) untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Arc<ActiveSession>, AppError> {
        let _transition = self.transition.lock().await;

        let tenant = self.directory.resolve(username, password).await?;
        let session = self.activate(&tenant).await?;
        if let Err(e) = self.state_store.save(&tenant.tenant_id).await {
            warn!(tenant_id = %tenant.tenant_id, "Could not persist session state: {}", e);
        }

        info!(tenant_id = %tenant.tenant_id, "Operator logged in");
        Ok(session)
    }

    /// Safe to call without an active session.
    pub async fn logout(&self) -> Result<(), AppError> {
        let _transition = self.transition.lock().await;

        if let Some(tenant_id) = self.teardown().await {
            info!(tenant_id = %tenant_id, "Operator logged out");
        }
        self.state_store.clear().await
    }

    /// Re-activates the persisted tenant without asking for credentials.
    pub async fn restore(&self) -> Result<Option<Arc<ActiveSession>>, AppError> {
        let _transition = self.transition.lock().await;

        let Some(tenant_id) = self.state_store.load().await? else {
            return Ok(None);
        };

        let Some(tenant) = self.directory.config_for(&tenant_id).await? else {
            warn!(tenant_id = %tenant_id, "Persisted tenant is no longer configured; clearing session state");
            self.state_store.clear().await?;
            return Ok(None);
        };

        let session = self.activate(&tenant).await?;
        info!(tenant_id = %tenant_id, "Session restored");
        Ok(Some(session))
    }

    pub async fn active(&self) -> Result<Arc<ActiveSession>, AppError> {
        self.active.read().await.clone().ok_or(AppError::NoActiveSession)
    }

    /// Starts a session for `tenant` and swaps it in, shutting the previous one down.
    async fn activate(&self, tenant: &TenantConfig) -> Result<Arc<ActiveSession>, AppError> {
        let started = match self.router.activate(tenant).await {
            Ok(connection) => ActiveSession::start(connection).await,
            Err(e) => Err(e),
        };

        let session = match started {
            Ok(session) => session,
            Err(e) => {
                warn!(tenant_id = %tenant.tenant_id, "Session start failed: {}", e);
                let current = self.active.read().await.as_ref().map(|s| s.connection.clone());
                self.router.reset_to(current);
                return Err(e);
            }
        };

        let previous = self.active.write().await.replace(session.clone());
        if let Some(previous) = previous {
            previous.shutdown();
            info!(tenant_id = %previous.tenant_id(), "Previous session closed");
        }
        Ok(session)
    }

    async fn teardown(&self) -> Option<String> {
        let previous = self.active.write().await.take();
        self.router.deactivate();

        previous.map(|session| {
            session.shutdown();
            session.tenant.tenant_id.clone()
        })
    }
}
