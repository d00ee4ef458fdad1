use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use crate::{models::{BuildRequest, ErrorResponse, ExecResult}, state::AppState};

/// Workspace shared by every REST caller
pub const REST_WORKSPACE: &str = "rest";

/// Compile the posted source in the REST workspace
pub async fn build(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<BuildRequest>,
) -> Result<(StatusCode, Json<ExecResult>), (StatusCode, Json<ErrorResponse>)> {

    let max = app_state.config.max_content_size;
    if request.code.chars().count() > max {
        let status = StatusCode::PAYLOAD_TOO_LARGE;
        return Err((status, Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: format!("Code exceeds the maximum size of {} characters", max),
        })));
    }

    info!("🔨 REST build requested ({} bytes)", request.code.len());
    let result = app_state.sandbox.build_source(REST_WORKSPACE, &request.code).await;
    Ok((StatusCode::OK, Json(result)))
}

/// Run the binary last built through the REST surface
pub async fn run(State(app_state): State<Arc<AppState>>) -> (StatusCode, Json<ExecResult>) {
    info!("▶️ REST run requested");
    let result = app_state.sandbox.run_workspace(REST_WORKSPACE).await;
    (StatusCode::OK, Json(result))
}
