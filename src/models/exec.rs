use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of a sandboxed build or run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

/// Body of a REST build request
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct BuildRequest {
    pub code: String,
}

/// Current document state served over REST
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct DocumentResponse {
    pub content: String,
    pub version: u64,
}
