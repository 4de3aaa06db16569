//! Primary API: serves its YAML configuration and reaches the notification
//! service through the registry.
pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

/// Name reported in response bodies.
pub const SERVICE_LABEL: &str = "api-service";
