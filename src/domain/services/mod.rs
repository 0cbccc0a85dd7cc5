pub mod availability;
pub mod booking_store;
pub mod client_directory;
pub mod connection_router;
pub mod live_sync;
pub mod payment_reconciler;
pub mod session_manager;
pub mod tenant_directory;
