use std::sync::Arc;
use crate::models::{CollabError, CursorMessage};
use crate::state::AppState;

/// Handle CursorMessage
pub async fn handle_cursor_message(cursor_msg: &CursorMessage, session_id: &str, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    app_state.collab.lock().await.apply_cursor(session_id, &cursor_msg.position)?;
    Ok(())
}
