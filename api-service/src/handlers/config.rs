use crate::startup::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

pub async fn current_config(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.config.snapshot();

    Json(json!({
        "version": snapshot.version,
        "loaded_at": snapshot.loaded_at,
        "config": snapshot.document,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn reload_config(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let snapshot = state.config.reload().map_err(|e| {
        tracing::error!(
            source = %state.config.source().display(),
            error = %e,
            "Configuration reload failed, keeping current snapshot"
        );
        e
    })?;

    Ok(Json(json!({
        "version": snapshot.version,
        "loaded_at": snapshot.loaded_at,
    })))
}
