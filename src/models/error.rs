use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use crate::models::ValidationError;
use crate::services::rate_limiter::RateLimitExceeded;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Request-scoped failures reported to the sender as an `error` message.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("Invalid message format")]
    MalformedMessage(#[from] serde_json::Error),
    #[error("Unknown message type")]
    UnknownMessageType,
    #[error("Invalid operation: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    RateLimited(#[from] RateLimitExceeded),
    #[error("Session is not registered")]
    UnknownSession,
}
