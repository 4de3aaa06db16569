use crate::startup::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::registry::lookup;

pub const NO_INSTANCE_STATUS: &str = "No hay servicio de notificaciones registrado";
pub const SENT_STATUS: &str = "Notificación enviada";

/// Find a notification provider in the registry and forward to it.
///
/// Registry failures go straight back to the caller; the next request is the
/// retry.
#[tracing::instrument(skip(state))]
pub async fn notify(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let capability = &state.settings.notify_capability;

    let instance = lookup(state.registry.as_ref(), capability, state.settings.lookup_timeout)
        .await
        .map_err(|e| {
            tracing::warn!(capability = %capability, kind = e.kind(), error = %e, "Discovery failed");
            AppError::from(e)
        })?;

    let Some(instance) = instance else {
        tracing::info!(capability = %capability, "No provider registered");
        return Ok(Json(json!({ "status": NO_INSTANCE_STATUS })));
    };

    tracing::info!(
        capability = %capability,
        service_id = %instance.service_id,
        address = %instance.address,
        port = instance.port,
        "Forwarding notification"
    );

    let notification = state.notifier.send(&instance, &json!({})).await?;

    Ok(Json(json!({
        "status": SENT_STATUS,
        "service": instance.address,
        "port": instance.port,
        "notification": notification,
    })))
}
