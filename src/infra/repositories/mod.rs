pub mod json_tenant_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_client_repo;
pub mod sqlite_commit_watch;
