//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::core::storage::Store;

const SERVICE_NAME: &str = "chantierserver";

/// Readiness: pings the store. The only endpoint that reports error detail.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let store = state.store.clone();
    let backend = store.backend();
    let ping = run_blocking(move || store.ping()).await;

    match ping {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "service": SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "backend": backend,
                "database": true,
                "started_at": state.started_at,
            })),
        ),
        Err(err) => {
            log::warn!("Health check failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "service": SERVICE_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                    "backend": backend,
                    "database": false,
                    "detail": err.to_string(),
                })),
            )
        }
    }
}

pub async fn health_check_simple() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
