use std::sync::Arc;
use tracing::error;
use crate::models::{CollabError, SendMessage};
use crate::state::AppState;
use crate::ws::session::Transport;

/// Handle a run request for the binary last built by this session.
pub async fn handle_run_message(session_id: &str, transport: &Transport, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    let state = app_state.clone();
    let transport = transport.clone();
    let session_id = session_id.to_string();
    tokio::spawn(async move {
        let result = state.sandbox.run_workspace(&session_id).await;
        if let Err(e) = transport.send(&SendMessage::RunResult(result)) {
            error!("❌ Failed to send run result to session {}: {}", session_id, e);
        }
    });
    Ok(())
}
