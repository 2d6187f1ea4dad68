pub mod auth;
pub mod metrics;
pub mod uploads;
pub mod user;
