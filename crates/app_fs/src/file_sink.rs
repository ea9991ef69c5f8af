//! Deleting image files

use crate::{FsError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Destination for deleted images.
///
/// The core does not care whether the file ends up in the trash or is
/// unlinked; it only needs success or failure.
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn delete(&self, path: &str) -> Result<()>;
}

/// File sink backed by the real file system
#[derive(Debug, Clone)]
pub struct SystemFileSink {
    use_trash: bool,
}

impl SystemFileSink {
    pub fn new(use_trash: bool) -> Self {
        Self { use_trash }
    }
}

impl Default for SystemFileSink {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl FileSink for SystemFileSink {
    async fn delete(&self, path: &str) -> Result<()> {
        let target = PathBuf::from(path);
        if !tokio::fs::try_exists(&target).await? {
            return Err(FsError::NotFound(path.to_string()));
        }

        if self.use_trash {
            move_to_trash(target).await?;
            tracing::info!("Moved to trash: {}", path);
        } else {
            tokio::fs::remove_file(&target).await?;
            tracing::info!("Permanently deleted: {}", path);
        }
        Ok(())
    }
}

#[cfg(feature = "trash-support")]
async fn move_to_trash(target: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || trash::delete(&target))
        .await
        .map_err(|e| FsError::Task(e.to_string()))??;
    Ok(())
}

#[cfg(not(feature = "trash-support"))]
async fn move_to_trash(target: PathBuf) -> Result<()> {
    tracing::warn!("Trash support disabled, deleting permanently: {:?}", target);
    tokio::fs::remove_file(&target).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlink_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"img").unwrap();

        let sink = SystemFileSink::new(false);
        sink.delete(file.to_str().unwrap()).await.unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing.jpg");

        let sink = SystemFileSink::new(false);
        let err = sink.delete(file.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }
}
