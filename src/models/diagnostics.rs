use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for diagnostics information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_sessions: u32,
    pub max_sessions: u32,
    pub version: u64,
    pub n_history: u32,
    pub content_length: u32,
    /// Session that produced the latest version, if any edit was made
    pub last_editor: Option<String>,
    pub last_edit_at: Option<DateTime<Utc>>,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
