//! /status handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub peers: usize,
    pub live_peers: usize,
}

pub async fn handle_status(
    State(state): State<ApiState>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let store = state.registry.store().clone();
    let stats = tokio::task::spawn_blocking(move || store.stats())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "store stats failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        })?;

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        peers: stats.peers,
        live_peers: stats.live_peers,
    }))
}
