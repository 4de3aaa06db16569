//! Metrics collection for notification-service.
//!
//! HTTP and registry metrics go through the shared `metrics` recorder;
//! notification counts live in a dedicated Prometheus registry.

use prometheus::{IntCounterVec, Opts, Registry};
use service_core::error::AppError;
use service_core::observability;
use std::sync::OnceLock;

static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
static NOTIFICATION_SENT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn prometheus_error(e: prometheus::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("prometheus: {}", e))
}

/// Install the recorder and register the service counters.
pub fn init_metrics() -> Result<(), AppError> {
    observability::init_metrics()?;

    let registry = Registry::new();

    let notifications_counter = IntCounterVec::new(
        Opts::new(
            "notification_sent_total",
            "Total notifications handled by outcome",
        ),
        &["status"],
    )
    .map_err(prometheus_error)?;

    registry
        .register(Box::new(notifications_counter.clone()))
        .map_err(prometheus_error)?;

    PROMETHEUS_REGISTRY
        .set(registry)
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("metrics registry already set")))?;
    NOTIFICATION_SENT_TOTAL
        .set(notifications_counter)
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("notification counter already set")))
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = observability::render_metrics();

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&registry.gather(), &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Count a handled notification. No-op until [`init_metrics`] ran.
pub fn record_notification(status: &str) {
    if let Some(counter) = NOTIFICATION_SENT_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
