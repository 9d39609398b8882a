use super::iso_timestamp;
use crate::startup::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the process started serving.
    pub uptime: f64,
}

/// Liveness endpoint. Does not touch the upstream model API.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: iso_timestamp(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}
