use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Served when the backing file cannot be read at startup.
pub const DEFAULT_DOCUMENT: &str = r#"#include <stdio.h>

int main(void){
    int rc = 0;
    puts("Hello world!");
    printf("Exit code: %d\n", rc);
    return rc;
}"#;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Backing file of the shared document.
///
/// Writes are serialized and remember the newest version on disk, so a
/// snapshot that lost the race to a newer one is never written over it.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
    written: Arc<Mutex<Option<u64>>>,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), written: Arc::new(Mutex::new(None)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<String, PersistenceError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| PersistenceError::Read { path: self.path.clone(), source })
    }

    /// Initial document content, falling back to [`DEFAULT_DOCUMENT`].
    pub async fn load_or_default(&self) -> String {
        match self.read().await {
            Ok(content) => {
                info!("📄 Loaded document from {}", self.path.display());
                content
            }
            Err(e) => {
                warn!("{}; starting from the default document", e);
                DEFAULT_DOCUMENT.to_string()
            }
        }
    }

    /// Persist the snapshot of `version`. Goes through a uniquely named
    /// sibling temp file, so a failed save leaves the old file intact.
    pub async fn write(&self, text: &str, version: u64) -> Result<(), PersistenceError> {
        let mut written = self.written.lock().await;
        if written.is_some_and(|newest| newest > version) {
            debug!("Version {} already superseded on disk by {:?}", version, *written);
            return Ok(());
        }

        let tmp = self.temp_path();
        let result = match tokio::fs::write(&tmp, text).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("💾 Saved version {} to {}", version, self.path.display());
                *written = Some(version);
                Ok(())
            }
            Err(source) => {
                error!("❌ Failed to save document to {}: {}", self.path.display(), source);
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(PersistenceError::Write { path: self.path.clone(), source })
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("hello.c"));

        file.write("int main(void) { return 0; }", 1).await.unwrap();
        assert_eq!(file.read().await.unwrap(), "int main(void) { return 0; }");

        file.write("changed", 2).await.unwrap();
        assert_eq!(file.read().await.unwrap(), "changed");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn older_snapshot_never_replaces_a_newer_one() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("hello.c"));
        file.write("v5", 5).await.unwrap();
        file.write("v3", 3).await.unwrap();
        assert_eq!(file.read().await.unwrap(), "v5");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_saves_all_succeed_and_newest_wins() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("hello.c"));
        let older = "a".repeat(1024 * 1024);
        let newer = "b".repeat(1024 * 1024);

        for round in 0..20u64 {
            let (a, b) = tokio::join!(
                file.write(&older, round * 2),
                file.write(&newer, round * 2 + 1),
            );
            a.unwrap();
            b.unwrap();
            assert_eq!(file.read().await.unwrap(), newer);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("absent.c"));
        assert!(matches!(file.read().await, Err(PersistenceError::Read { .. })));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("no/such/dir/hello.c"));
        let err = file.write("x", 1).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
        assert!(err.to_string().contains("hello.c"));
    }

    #[tokio::test]
    async fn missing_file_loads_default_document() {
        let dir = TempDir::new().unwrap();
        let file = DocumentFile::new(dir.path().join("absent.c"));
        assert_eq!(file.load_or_default().await, DEFAULT_DOCUMENT);
        assert!(DEFAULT_DOCUMENT.contains(r#"printf("Exit code: %d\n", rc);"#));

        std::fs::write(file.path(), "int main;").unwrap();
        assert_eq!(file.load_or_default().await, "int main;");
    }
}
