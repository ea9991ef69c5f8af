//! Per-directory tag persistence

use crate::path_utils::{dir_of, name_of};
use crate::{FsError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name -> tag list for one directory
pub type TagMap = BTreeMap<String, Vec<String>>;

/// Backing store for image tags.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Load every tagged file of `dir` (a directory prefix as produced by
    /// [`dir_of`]). Absent or unreadable directories yield an empty map.
    async fn load_dir(&self, dir: &str) -> Result<TagMap>;

    /// Replace the tags of the file at `path`.
    async fn save(&self, path: &str, tags: &[String]) -> Result<()>;
}

/// Stores tags in one JSON sidecar file per directory:
/// `{ "cat.jpg": ["animals", "cute"], ... }`
pub struct SidecarTagStore {
    file_name: String,
    /// Serializes read-modify-write cycles on sidecar files
    write_lock: tokio::sync::Mutex<()>,
}

impl SidecarTagStore {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn sidecar_path(&self, dir: &str) -> PathBuf {
        Path::new(dir).join(&self.file_name)
    }

    async fn read_map(&self, sidecar: &Path) -> Result<TagMap> {
        let content = match tokio::fs::read_to_string(sidecar).await {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                tracing::debug!("No readable tag file at {:?}: {}", sidecar, e);
                return Ok(TagMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(TagMap::new());
        }

        serde_json::from_str(&content).map_err(|source| FsError::Json {
            path: sidecar.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl TagStore for SidecarTagStore {
    async fn load_dir(&self, dir: &str) -> Result<TagMap> {
        let map = self.read_map(&self.sidecar_path(dir)).await?;
        tracing::debug!("Loaded tags for {} files in {:?}", map.len(), dir);
        Ok(map)
    }

    async fn save(&self, path: &str, tags: &[String]) -> Result<()> {
        let name = name_of(path);
        if name.is_empty() {
            return Err(FsError::InvalidPath(path.to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let sidecar = self.sidecar_path(dir_of(path));
        let mut map = self.read_map(&sidecar).await?;

        if tags.is_empty() {
            map.remove(name);
        } else {
            map.insert(name.to_string(), tags.to_vec());
        }

        let json = serde_json::to_string_pretty(&map).map_err(|source| FsError::Json {
            path: sidecar.display().to_string(),
            source,
        })?;

        // Write next to the target and rename so readers never see a torn file
        let mut tmp = sidecar.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &sidecar).await?;

        tracing::info!("Saved {} tags for {}", tags.len(), path);
        Ok(())
    }
}
