use tokio::sync::Mutex;
use crate::config::Config;
use crate::services::document_file::DocumentFile;
use crate::services::sandbox::{Sandbox, SandboxConfig};
use crate::ws::collab::CollabState;

/// Shared by every connection and REST handler.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub collab: Mutex<CollabState>,
    pub sandbox: Sandbox,
    pub document_file: DocumentFile,
}

impl AppState {
    pub fn new(config: Config, initial_content: impl Into<String>) -> Self {
        Self {
            collab: Mutex::new(CollabState::new(&config, initial_content)),
            sandbox: Sandbox::new(SandboxConfig::from_config(&config)),
            document_file: DocumentFile::new(config.document_path.clone()),
            config,
        }
    }
}
