use std::sync::Arc;
use tracing::{error, info};
use crate::models::{CollabError, SendMessage};
use crate::state::AppState;
use crate::ws::session::Transport;

/// Handle a build request. The compile runs in its own task so the
/// connection keeps processing edits meanwhile.
pub async fn handle_build_message(session_id: &str, transport: &Transport, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    let code = {
        let collab = app_state.collab.lock().await;
        collab.build_started(session_id);
        collab.document.content().to_string()
    };
    info!("🔨 Build requested by session {}", session_id);

    let state = app_state.clone();
    let transport = transport.clone();
    let session_id = session_id.to_string();
    tokio::spawn(async move {
        let result = state.sandbox.build_source(&session_id, &code).await;
        if let Err(e) = transport.send(&SendMessage::BuildResult(result)) {
            error!("❌ Failed to send build result to session {}: {}", session_id, e);
        }
    });
    Ok(())
}
