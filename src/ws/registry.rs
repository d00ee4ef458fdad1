use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, error, info};
use crate::models::{SendMessage, UserInfo};
use super::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Server is at capacity ({0} sessions)")]
    AtCapacity(usize),
}

/// Live sessions in connection order, plus fan-out delivery.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: IndexMap<String, Session>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self { sessions: IndexMap::new(), max_sessions }
    }

    /// Add a session. A refused session is told why and has its transport closed.
    pub fn register(&mut self, session: Session) -> Result<(), RegistryError> {
        if self.sessions.len() >= self.max_sessions {
            info!("Refusing session {}: {} sessions connected", session.id, self.sessions.len());
            let err = RegistryError::AtCapacity(self.max_sessions);
            let _ = session.transport.send(&SendMessage::error(err.to_string()));
            session.transport.close();
            return Err(err);
        }
        info!("👤 Session {} registered ({} total)", session.id, self.sessions.len() + 1);
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    pub fn remove(&mut self, session_id: &str) -> Option<Session> {
        let removed = self.sessions.shift_remove(session_id);
        if let Some(session) = &removed {
            info!("👋 {} left ({} remaining)", session.name, self.sessions.len());
        }
        removed
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn snapshot(&self) -> Vec<UserInfo> {
        self.sessions.values().map(Session::info).collect()
    }

    /// Deliver `msg` to every session but `exclude`, in registration order.
    /// Closed transports are skipped and a failed send only affects its
    /// recipient. Returns the number of successful deliveries.
    pub fn broadcast(&self, msg: &SendMessage, exclude: Option<&str>) -> usize {
        let text = match msg.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode broadcast: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, session) in &self.sessions {
            if Some(id.as_str()) == exclude {
                continue;
            }
            if !session.transport.is_open() {
                debug!("Skipping session {} with closed transport", id);
                continue;
            }
            match session.transport.send_text(text.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => error!("❌ Failed to send message to session {}: {}", id, e),
            }
        }
        delivered
    }

    /// Send to one session only. Returns whether it was delivered.
    pub fn send_to(&self, session_id: &str, msg: &SendMessage) -> bool {
        let Some(session) = self.sessions.get(session_id) else {
            return false;
        };
        match session.transport.send(msg) {
            Ok(()) => true,
            Err(e) => {
                error!("❌ Failed to send message to session {}: {}", session_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::session::Transport;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc::Receiver;

    fn session() -> (Session, Receiver<Message>) {
        let (transport, rx) = Transport::channel(8);
        (Session::new(transport), rx)
    }

    fn drain(rx: &mut Receiver<Message>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let Message::Text(text) = msg {
                out.push(text);
            }
        }
        out
    }

    #[test]
    fn rejects_registration_at_capacity_and_closes_transport() {
        let mut registry = SessionRegistry::new(1);
        let (first, _rx1) = session();
        registry.register(first).unwrap();

        let (second, mut rx2) = session();
        assert_eq!(registry.register(second), Err(RegistryError::AtCapacity(1)));
        match rx2.try_recv() {
            Ok(Message::Text(text)) => assert!(text.contains("Server is at capacity")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(rx2.try_recv(), Ok(Message::Close(None))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn broadcast_skips_excluded_and_closed_sessions() {
        let mut registry = SessionRegistry::new(10);
        let (a, mut rx_a) = session();
        let (b, mut rx_b) = session();
        let (c, rx_c) = session();
        let a_id = a.id.clone();
        registry.register(a).unwrap();
        registry.register(b).unwrap();
        registry.register(c).unwrap();
        drop(rx_c);

        let delivered = registry.broadcast(&SendMessage::error("hi"), Some(&a_id));
        assert_eq!(delivered, 1);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![r#"{"type":"error","message":"hi"}"#.to_string()]);
    }

    #[test]
    fn full_recipient_does_not_abort_broadcast() {
        let mut registry = SessionRegistry::new(10);
        let (slow_transport, _slow_rx) = Transport::channel(1);
        let slow = Session::new(slow_transport);
        let (fast, mut rx_fast) = session();
        registry.register(slow).unwrap();
        registry.register(fast).unwrap();

        assert_eq!(registry.broadcast(&SendMessage::error("1"), None), 2);
        assert_eq!(registry.broadcast(&SendMessage::error("2"), None), 1);
        assert_eq!(drain(&mut rx_fast).len(), 2);
    }

    #[test]
    fn snapshot_keeps_registration_order_after_removal() {
        let mut registry = SessionRegistry::new(10);
        let mut ids = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (s, rx) = session();
            ids.push(s.id.clone());
            receivers.push(rx);
            registry.register(s).unwrap();
        }
        assert!(registry.remove(&ids[1]).is_some());
        assert!(registry.remove(&ids[1]).is_none());

        let order: Vec<String> = registry.snapshot().into_iter().map(|u| u.id).collect();
        assert_eq!(order, vec![ids[0].clone(), ids[2].clone()]);
        assert!(registry.send_to(&ids[2], &SendMessage::error("direct")));
        assert!(!registry.send_to(&ids[1], &SendMessage::error("gone")));
    }
}
