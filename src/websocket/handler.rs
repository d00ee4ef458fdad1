use std::sync::Arc;
use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::models::{CollabError, ReceivedMessage, SendMessage};
use crate::state::AppState;
use crate::websocket::msg_build_handler::handle_build_message;
use crate::websocket::msg_cursor_handler::handle_cursor_message;
use crate::websocket::msg_join_handler::handle_join_message;
use crate::websocket::msg_operation_handler::handle_operation_message;
use crate::websocket::msg_run_handler::handle_run_message;
use crate::websocket::msg_save_handler::handle_save_message;
use crate::ws::session::{Transport, TRANSPORT_CAPACITY};

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (transport, mut outbound) = Transport::channel(TRANSPORT_CAPACITY);

    // Drain the outbound queue into the socket until it is closed.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let connected = app_state.collab.lock().await.connect(transport.clone());
    let session_id = match connected {
        Ok(session_id) => session_id,
        Err(e) => {
            warn!("WebSocket connection refused: {}", e);
            drop(transport);
            let _ = send_task.await;
            return;
        }
    };
    info!("WebSocket connection established with session_id: {}", session_id);

    let state = app_state.clone();
    let sid = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => handle_text(&text, &sid, &transport, &state).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket error for session {}: {}", sid, e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    app_state.collab.lock().await.disconnect(&session_id);
    app_state.sandbox.discard_workspace(&session_id).await;
    info!("WebSocket connection terminated for session_id: {}", session_id);
}

/// Decode one text frame and route it to its handler. Failures go back to the
/// sender only and leave the connection open.
pub async fn handle_text(text: &str, session_id: &str, transport: &Transport, app_state: &Arc<AppState>) {
    let result = match serde_json::from_str::<ReceivedMessage>(text) {
        Ok(ReceivedMessage::Join(msg)) => handle_join_message(&msg, session_id, app_state).await,
        Ok(ReceivedMessage::Operation(msg)) => handle_operation_message(&msg, session_id, app_state).await,
        Ok(ReceivedMessage::Cursor(msg)) => handle_cursor_message(&msg, session_id, app_state).await,
        Ok(ReceivedMessage::Save {}) => handle_save_message(session_id, transport, app_state).await,
        Ok(ReceivedMessage::Build {}) => handle_build_message(session_id, transport, app_state).await,
        Ok(ReceivedMessage::Run {}) => handle_run_message(session_id, transport, app_state).await,
        Ok(ReceivedMessage::Unknown) => Err(CollabError::UnknownMessageType),
        Err(e) => Err(CollabError::from(e)),
    };

    if let Err(e) = result {
        warn!("Rejected message from session {}: {}", session_id, e);
        if let Err(send_err) = transport.send(&SendMessage::error(e.to_string())) {
            error!("❌ Failed to send error to session {}: {}", session_id, send_err);
        }
    }
}
