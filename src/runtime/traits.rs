//! Trait abstractions for local side effects
//!
//! The report service trait lives in `crate::service`; this covers what
//! happens to the report once it reaches the client.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Destination for downloaded reports
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `bytes` under `file_name` and return where they ended up
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

#[async_trait]
impl<T: ArtifactSink + ?Sized> ArtifactSink for Arc<T> {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        (**self).save(file_name, bytes).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Writes reports into a directory on disk
#[derive(Debug, Clone)]
pub struct FileArtifactSink {
    dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileArtifactSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
