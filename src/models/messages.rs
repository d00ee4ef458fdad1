use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::{ExecResult, Operation, UserInfo};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JoinUser {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JoinMessage {
    #[serde(default)]
    pub user: JoinUser,
}

/// The operation stays untyped here, it is validated by `Operation::parse`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OperationMessage {
    #[serde(default)]
    pub operation: Value,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CursorMessage {
    #[serde(default)]
    pub position: Value,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "join")]
    Join(JoinMessage),
    #[serde(rename = "operation")]
    Operation(OperationMessage),
    #[serde(rename = "cursor")]
    Cursor(CursorMessage),
    #[serde(rename = "save")]
    Save {},
    #[serde(rename = "build")]
    Build {},
    #[serde(rename = "run")]
    Run {},
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitMessage {
    pub session_id: String,
    pub content: String,
    pub version: u64,
    pub users: Vec<UserInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    pub users: Vec<UserInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OperationBroadcast {
    pub operation: Operation,
    pub session_id: String,
    pub version: u64,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdateMessage {
    pub session_id: String,
    pub position: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultMessage {
    pub success: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotice {
    pub session_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendMessage {
    Init(InitMessage),
    UserJoined(PresenceMessage),
    UserLeft(PresenceMessage),
    Operation(OperationBroadcast),
    CursorUpdate(CursorUpdateMessage),
    SaveResult(SaveResultMessage),
    FileSaved(SessionNotice),
    BuildStarted(SessionNotice),
    BuildResult(ExecResult),
    RunResult(ExecResult),
    Error(ErrorMessage),
}

impl SendMessage {
    pub fn error(message: impl Into<String>) -> Self {
        SendMessage::Error(ErrorMessage { message: message.into() })
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
