use std::sync::Arc;
use tracing::debug;
use crate::models::{CollabError, OperationMessage};
use crate::state::AppState;

/// Handle OperationMessage - Check, Apply and Broadcast under one lock
pub async fn handle_operation_message(op_msg: &OperationMessage, session_id: &str, app_state: &Arc<AppState>) -> Result<(), CollabError> {
    let mut collab = app_state.collab.lock().await;
    if let Some(version) = collab.apply_operation(session_id, &op_msg.operation)? {
        debug!("Session {} produced version {}", session_id, version);
    }
    Ok(())
}
