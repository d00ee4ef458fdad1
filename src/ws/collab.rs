use serde_json::Value;
use tracing::{info, warn};
use crate::config::Config;
use crate::models::{
    parse_position, CollabError, CursorUpdateMessage, InitMessage, JoinUser, Operation,
    OperationBroadcast, PresenceMessage, SendMessage, SessionNotice,
};
use crate::services::document_store::DocumentStore;
use crate::services::rate_limiter::RateLimiter;
use super::registry::{RegistryError, SessionRegistry};
use super::session::{Session, Transport};

/// The shared collaboration state of the server.
///
/// Every method runs one message to completion (validate, apply, broadcast)
/// while the caller holds the state lock, so all clients observe the same
/// order of versions.
#[derive(Debug)]
pub struct CollabState {
    pub document: DocumentStore,
    pub sessions: SessionRegistry,
    pub limiter: RateLimiter,
    max_content_size: usize,
}

impl CollabState {
    pub fn new(config: &Config, initial_content: impl Into<String>) -> Self {
        Self {
            document: DocumentStore::new(initial_content, config.max_content_size, config.history_cap),
            sessions: SessionRegistry::new(config.max_sessions),
            limiter: RateLimiter::new(config.rate_limit),
            max_content_size: config.max_content_size,
        }
    }

    /// Register a new connection and seed it with the current state.
    pub fn connect(&mut self, transport: Transport) -> Result<String, RegistryError> {
        let session = Session::new(transport);
        let session_id = session.id.clone();
        self.sessions.register(session)?;
        let init = self.init_message(&session_id);
        self.sessions.send_to(&session_id, &init);
        Ok(session_id)
    }

    pub fn init_message(&self, session_id: &str) -> SendMessage {
        let (content, version) = self.document.current_content();
        SendMessage::Init(InitMessage {
            session_id: session_id.to_string(),
            content: content.to_string(),
            version,
            users: self.sessions.snapshot(),
        })
    }

    pub fn join(&mut self, session_id: &str, user: &JoinUser) -> Result<(), CollabError> {
        let session = self.sessions.get_mut(session_id).ok_or(CollabError::UnknownSession)?;
        session.set_identity(user.name.as_deref(), user.color.as_deref());
        let info = session.info();
        info!("👤 User {} joined ({} total users)", info.name, self.sessions.len());

        let msg = SendMessage::UserJoined(PresenceMessage {
            session_id: session_id.to_string(),
            user: Some(info),
            users: self.sessions.snapshot(),
        });
        self.sessions.broadcast(&msg, Some(session_id));
        Ok(())
    }

    /// Rate-limit, validate and apply one operation, then tell everyone else.
    pub fn apply_operation(&mut self, session_id: &str, raw: &Value) -> Result<Option<u64>, CollabError> {
        self.ensure_registered(session_id)?;
        self.limiter.check(session_id)?;
        let op = Operation::parse(raw, self.max_content_size)?;

        if let Operation::Cursor { position } = op {
            self.move_cursor(session_id, position);
            return Ok(None);
        }

        let Some(version) = self.document.apply(&op, session_id) else {
            return Ok(None);
        };
        let msg = SendMessage::Operation(OperationBroadcast {
            operation: op,
            session_id: session_id.to_string(),
            version,
            content: self.document.content().to_string(),
        });
        self.sessions.broadcast(&msg, Some(session_id));
        Ok(Some(version))
    }

    /// Handle a standalone cursor message.
    pub fn apply_cursor(&mut self, session_id: &str, raw: &Value) -> Result<usize, CollabError> {
        self.ensure_registered(session_id)?;
        self.limiter.check(session_id)?;
        let position = parse_position(Some(raw))?;
        Ok(self.move_cursor(session_id, position))
    }

    pub fn build_started(&self, session_id: &str) {
        let msg = SendMessage::BuildStarted(SessionNotice { session_id: session_id.to_string() });
        self.sessions.broadcast(&msg, Some(session_id));
    }

    pub fn file_saved(&self, session_id: &str) {
        let msg = SendMessage::FileSaved(SessionNotice { session_id: session_id.to_string() });
        self.sessions.broadcast(&msg, Some(session_id));
    }

    /// Drop a session and announce the departure if it was known.
    pub fn disconnect(&mut self, session_id: &str) -> bool {
        self.limiter.forget(session_id);
        if self.sessions.remove(session_id).is_none() {
            return false;
        }
        let msg = SendMessage::UserLeft(PresenceMessage {
            session_id: session_id.to_string(),
            user: None,
            users: self.sessions.snapshot(),
        });
        self.sessions.broadcast(&msg, None);
        true
    }

    fn move_cursor(&mut self, session_id: &str, position: usize) -> usize {
        let clamped = self.document.clamp_position(position);
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.cursor = clamped;
        }
        let msg = SendMessage::CursorUpdate(CursorUpdateMessage {
            session_id: session_id.to_string(),
            position: clamped,
        });
        self.sessions.broadcast(&msg, Some(session_id));
        clamped
    }

    fn ensure_registered(&self, session_id: &str) -> Result<(), CollabError> {
        if self.sessions.get(session_id).is_none() {
            warn!("Message from unregistered session {}", session_id);
            return Err(CollabError::UnknownSession);
        }
        Ok(())
    }
}
