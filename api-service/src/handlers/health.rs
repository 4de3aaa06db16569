use crate::SERVICE_LABEL;
use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_LABEL,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
