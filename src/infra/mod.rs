pub mod factory;
pub mod mirror;
pub mod repositories;
pub mod session;
