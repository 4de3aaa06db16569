//! HTTP handlers for notification-service.

pub mod health;
pub mod home;
pub mod metrics;
pub mod notify;
pub mod status;

pub use health::health_check;
pub use home::home;
pub use metrics::metrics_endpoint;
pub use notify::send_notification;
pub use status::registration_status;
