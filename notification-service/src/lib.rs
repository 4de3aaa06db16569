//! Notification service: answers `/notify` and keeps itself listed in the
//! service registry for as long as it runs.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

/// Name reported in response bodies.
pub const SERVICE_LABEL: &str = "notification-service";
