//! HTTP handlers for api-service.

pub mod config;
pub mod health;
pub mod home;
pub mod metrics;
pub mod notify;

pub use self::config::{current_config, reload_config};
pub use health::health_check;
pub use home::home;
pub use metrics::metrics_endpoint;
pub use notify::notify;
