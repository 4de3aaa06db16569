use crate::startup::AppState;
use crate::SERVICE_LABEL;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

/// Target of the registry's HTTP health check. Always 200 while the process
/// serves requests.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_LABEL,
        "service_id": state.descriptor.service_id,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
