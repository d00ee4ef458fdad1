use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use crate::models::HealthResponse;
use crate::state::AppState;
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    let sessions = app_state.collab.lock().await.sessions.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        sessions,
    })
}

/// Readiness check endpoint. Not ready while every session slot is taken.
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    let (sessions, max_sessions) = {
        let collab = app_state.collab.lock().await;
        (collab.sessions.len(), collab.sessions.max_sessions())
    };
    if sessions >= max_sessions {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse {
            status: "unavailable".to_string(),
            message: format!("Server is at capacity ({} sessions)", max_sessions),
            sessions,
        }));
    }
    (StatusCode::OK, Json(HealthResponse {
        status: "ok".to_string(),
        message: "Service is ready".to_string(),
        sessions,
    }))
}
