use std::sync::Arc;
use tracing::{error, info};
use crate::models::{CollabError, SaveResultMessage, SendMessage};
use crate::state::AppState;
use crate::ws::session::Transport;

/// Handle a save request: persist the current snapshot, reply to the sender
/// and let everyone else know on success.
pub async fn handle_save_message(session_id: &str, transport: &Transport, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    let (content, version) = {
        let collab = app_state.collab.lock().await;
        let (content, version) = collab.document.current_content();
        (content.to_string(), version)
    };

    let file = &app_state.document_file;
    let success = match file.write(&content, version).await {
        Ok(()) => {
            info!("Session {} saved version {} to {}", session_id, version, file.path().display());
            true
        }
        Err(e) => {
            error!("Save requested by session {} failed: {}", session_id, e);
            false
        }
    };

    if let Err(e) = transport.send(&SendMessage::SaveResult(SaveResultMessage { success })) {
        error!("❌ Failed to send save result to session {}: {}", session_id, e);
    }
    if success {
        app_state.collab.lock().await.file_saved(session_id);
    }
    Ok(())
}
