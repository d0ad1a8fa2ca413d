//! Health check HTTP handler

use axum::{Json, extract::State};

use crate::web::{
    AppState,
    responses::HealthResponse,
};

/// Health check endpoint
///
/// Reports liveness, version, uptime and cache counters
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.fingerprint_service.cache().stats().await;
    let now = chrono::Utc::now();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.start_time,
        uptime_seconds: (now - state.start_time).num_seconds(),
        cache: stats.into(),
    })
}
