use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;
use crate::models::{SendMessage, UserInfo};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_COLOR_LEN: usize = 32;
pub const TRANSPORT_CAPACITY: usize = 256;

const PALETTE: [&str; 8] = [
    "#007acc", "#4CAF50", "#ff9800", "#9c27b0", "#f44336", "#00bcd4", "#795548", "#607d8b",
];

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("outbound queue is full")]
    Full,
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of a connection. A writer task drains the channel into the socket.
#[derive(Debug, Clone)]
pub struct Transport {
    tx: mpsc::Sender<Message>,
}

impl Transport {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, msg: &SendMessage) -> Result<(), TransportError> {
        self.send_text(msg.to_text()?)
    }

    pub fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.tx.try_send(Message::Text(text)).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Ask the writer to close the socket.
    pub fn close(&self) {
        let _ = self.tx.try_send(Message::Close(None));
    }
}

/// One connected participant.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub color: String,
    pub cursor: usize,
    pub joined_at: DateTime<Utc>,
    pub transport: Transport,
}

impl Session {
    /// A fresh session with a placeholder identity, replaced on join.
    pub fn new(transport: Transport) -> Self {
        let id = Uuid::new_v4();
        let seed = id.as_bytes();
        let number = u16::from_be_bytes([seed[0], seed[1]]) % 1000;
        Self {
            id: id.to_string(),
            name: format!("User-{number}"),
            color: PALETTE[seed[2] as usize % PALETTE.len()].to_string(),
            cursor: 0,
            joined_at: Utc::now(),
            transport,
        }
    }

    pub fn set_identity(&mut self, name: Option<&str>, color: Option<&str>) {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.name = name.chars().take(MAX_NAME_LEN).collect();
        }
        if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
            self.color = color.chars().take(MAX_COLOR_LEN).collect();
        }
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            cursor: self.cursor,
            joined_at: self.joined_at,
        }
    }
}
