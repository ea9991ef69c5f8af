//! In-memory collaborators
//!
//! Used by hosts that have no real file system behind them and by tests that
//! need to observe or fail the calls the core makes.

use crate::path_utils::{dir_of, name_of};
use crate::{FileSink, FsError, Result, TagMap, TagStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Tag store keeping every directory map in memory
#[derive(Default)]
pub struct MemoryTagStore {
    dirs: Mutex<HashMap<String, TagMap>>,
    load_calls: Mutex<Vec<String>>,
    save_calls: Mutex<Vec<(String, Vec<String>)>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    /// While set, `load_dir` waits until the semaphore is closed
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tags of the file at `path`
    pub fn insert(&self, path: &str, tags: &[&str]) {
        self.dirs
            .lock()
            .entry(dir_of(path).to_string())
            .or_default()
            .insert(
                name_of(path).to_string(),
                tags.iter().map(|t| t.to_string()).collect(),
            );
    }

    /// Tags currently stored for `path`
    pub fn tags(&self, path: &str) -> Option<Vec<String>> {
        self.dirs
            .lock()
            .get(dir_of(path))
            .and_then(|map| map.get(name_of(path)).cloned())
    }

    /// Directories requested through `load_dir`, in call order
    pub fn load_calls(&self) -> Vec<String> {
        self.load_calls.lock().clone()
    }

    /// Successful `save` calls, in call order
    pub fn save_calls(&self) -> Vec<(String, Vec<String>)> {
        self.save_calls.lock().clone()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `load_dir` calls wait until [`release_loads`](Self::release_loads)
    pub fn hold_loads(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let every held and future `load_dir` call proceed
    pub fn release_loads(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.close();
        }
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn load_dir(&self, dir: &str) -> Result<TagMap> {
        self.load_calls.lock().push(dir.to_string());

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal
            let _ = gate.acquire().await;
        }

        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(FsError::Simulated(format!("load_dir({})", dir)));
        }
        Ok(self.dirs.lock().get(dir).cloned().unwrap_or_default())
    }

    async fn save(&self, path: &str, tags: &[String]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(FsError::Simulated(format!("save({})", path)));
        }

        let mut dirs = self.dirs.lock();
        let map = dirs.entry(dir_of(path).to_string()).or_default();
        if tags.is_empty() {
            map.remove(name_of(path));
        } else {
            map.insert(name_of(path).to_string(), tags.to_vec());
        }
        drop(dirs);

        self.save_calls.lock().push((path.to_string(), tags.to_vec()));
        Ok(())
    }
}

/// File sink that only records what it was asked to delete
#[derive(Default)]
pub struct MemoryFileSink {
    deleted: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MemoryFileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileSink for MemoryFileSink {
    async fn delete(&self, path: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FsError::Simulated(format!("delete({})", path)));
        }
        self.deleted.lock().push(path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_tags_are_loaded_per_directory() {
        let store = MemoryTagStore::new();
        store.insert("/a/1.jpg", &["x", "y"]);
        store.insert("/b/2.jpg", &["z"]);

        let map = store.load_dir("/a/").await.unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["1.jpg"], vec!["x", "y"]);
        assert_eq!(store.load_calls(), vec!["/a/".to_string()]);
    }

    #[tokio::test]
    async fn test_held_loads_wait_for_release() {
        let store = Arc::new(MemoryTagStore::new());
        store.hold_loads();

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.load_dir("/a/").await })
        };
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        store.release_loads();
        assert!(task.await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = MemoryFileSink::new();
        sink.set_fail(true);
        assert!(sink.delete("/a.jpg").await.is_err());
        sink.set_fail(false);
        sink.delete("/a.jpg").await.unwrap();
        assert_eq!(sink.deleted(), vec!["/a.jpg".to_string()]);
    }
}
