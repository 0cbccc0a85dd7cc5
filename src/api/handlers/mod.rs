pub mod availability;
pub mod booking;
pub mod client;
pub mod health;
pub mod payment;
pub mod session;
