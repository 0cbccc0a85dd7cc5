pub mod availability;
pub mod booking;
pub mod client;
pub mod tenant;
