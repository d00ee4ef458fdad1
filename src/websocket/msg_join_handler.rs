use std::sync::Arc;
use tracing::info;
use crate::models::{CollabError, JoinMessage};
use crate::state::AppState;

/// Handle JoinMessage
pub async fn handle_join_message(join_msg: &JoinMessage, session_id: &str, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    info!("Join message received for session {}: {:?}", session_id, join_msg.user.name);
    app_state.collab.lock().await.join(session_id, &join_msg.user)
}
