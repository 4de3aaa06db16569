use crate::startup::AppState;
use crate::SERVICE_LABEL;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

/// Registration snapshot plus a fresh look at whether the registry still
/// lists this instance.
#[tracing::instrument(skip(state))]
pub async fn registration_status(State(state): State<AppState>) -> impl IntoResponse {
    let service_id = &state.descriptor.service_id;

    let (registered, error) = match state.registry.service(service_id).await {
        Ok(found) => (found.is_some(), None),
        Err(e) => {
            tracing::warn!(service_id = %service_id, error = %e, "Registry self-check failed");
            (false, Some(e.to_string()))
        }
    };

    Json(json!({
        "service": SERVICE_LABEL,
        "service_id": service_id,
        "registration_state": state.registration_state,
        "registry": {
            "endpoint": state.registry.endpoint(),
            "registered": registered,
            "error": error,
        },
        "descriptor": &*state.descriptor,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
