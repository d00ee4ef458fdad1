use std::sync::Arc;
use axum::{extract::State, Json};
use crate::{models::DocumentResponse, state::AppState};

/// Current shared document and its version
pub async fn document(State(app_state): State<Arc<AppState>>) -> Json<DocumentResponse> {
    let collab = app_state.collab.lock().await;
    let (content, version) = collab.document.current_content();
    Json(DocumentResponse { content: content.to_string(), version })
}
