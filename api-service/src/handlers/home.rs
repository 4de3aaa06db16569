use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.config.snapshot();

    Json(json!({
        "message": "API Principal funcionando",
        "config": snapshot.document,
        "config_version": snapshot.version,
    }))
}
