pub mod api;
pub mod attachment_factory;
pub mod config;
pub mod error;
pub mod record_factory;
pub mod sessions;
pub mod telemetry;
