use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{
    tenant::{TenantConfig, TenantRecord}, booking::{Booking, BookingPatch, PaymentMethod},
    client::Client, availability::AvailabilityDocument,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::broadcast;

/// Change notification emitted by a backing collection after every committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub collection: &'static str,
    pub document_id: String,
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<TenantRecord>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self) -> Result<Vec<Booking>, AppError>;
    async fn update(&self, id: &str, patch: &BookingPatch) -> Result<(), AppError>;
    /// Applies `patch` only while the booking is still pending; a paid booking yields `Conflict`.
    async fn update_if_pending(&self, id: &str, patch: &BookingPatch) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[async_trait]
/// Clients are registered by the booking channel; the admin side reads and deletes them.
pub trait ClientRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Client>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn load(&self) -> Result<Option<AvailabilityDocument>, AppError>;
    /// Merges the three availability fields into the stored document in one transaction.
    async fn save(&self, document: &AvailabilityDocument) -> Result<(), AppError>;
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSyncPayload {
    pub booking_id: String,
    pub payment_method: PaymentMethod,
    /// `D Month YYYY`, e.g. `10 December 2025`.
    pub payment_date: String,
    pub method_only: bool,
}

#[async_trait]
pub trait MirrorClient: Send + Sync {
    async fn register_booking(&self, booking_id: &str) -> Result<(), AppError>;
    async fn sync_payment(&self, payload: &PaymentSyncPayload) -> Result<(), AppError>;
}

#[async_trait]
pub trait SessionStateStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, AppError>;
    async fn save(&self, tenant_id: &str) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

/// Commit counter of a tenant store. The value moves whenever a write commits on another
/// connection, including writes from other processes that bypass the repositories.
#[async_trait]
pub trait CommitWatch: Send + Sync {
    async fn data_version(&self) -> Result<i64, AppError>;
}

pub struct ExternalChanges {
    pub watch: Arc<dyn CommitWatch>,
    pub interval: Duration,
}

/// Isolated handles onto one tenant's backend.
pub struct TenantConnection {
    pub tenant: TenantConfig,
    pub tz: Tz,
    pub bookings: Arc<dyn BookingRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub mirror: Option<Arc<dyn MirrorClient>>,
    /// Absent when the backend cannot report foreign commits.
    pub external_changes: Option<ExternalChanges>,
}

#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, tenant: &TenantConfig) -> Result<TenantConnection, AppError>;
}
