use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "Notification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "service_id": state.descriptor.service_id,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
