//! Directory-keyed tag cache over an injected [`TagStore`]

use crate::config::TagConfig;
use crate::error::{AppError, Result, TagRejection};
use crate::toast::Toast;
use app_fs::{dir_of, name_of, TagMap, TagStore};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Limits applied when saving tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLimits {
    pub max_tags: usize,
    /// In code points
    pub max_tag_chars: usize,
}

impl Default for TagLimits {
    fn default() -> Self {
        Self {
            max_tags: 50,
            max_tag_chars: 100,
        }
    }
}

impl From<&TagConfig> for TagLimits {
    fn from(config: &TagConfig) -> Self {
        Self {
            max_tags: config.max_tags,
            max_tag_chars: config.max_tag_chars,
        }
    }
}

/// Check a tag list before it is handed to the store.
///
/// Empty tags are ignored.
pub fn validate_tags(tags: &[String], limits: TagLimits) -> Result<()> {
    let count = tags.iter().filter(|t| !t.is_empty()).count();
    if count > limits.max_tags {
        return Err(AppError::TooManyTags {
            count,
            max: limits.max_tags,
        });
    }

    for tag in tags.iter().filter(|t| !t.is_empty()) {
        if let Some(reason) = check_tag(tag, limits) {
            return Err(AppError::InvalidTag {
                tag: tag.clone(),
                reason,
            });
        }
    }
    Ok(())
}

fn check_tag(tag: &str, limits: TagLimits) -> Option<TagRejection> {
    if tag.chars().count() > limits.max_tag_chars {
        return Some(TagRejection::TooLong);
    }
    if tag.contains(['\t', '\r', '\n']) {
        return Some(TagRejection::ForbiddenWhitespace);
    }
    if tag.chars().any(|c| (c as u32) < 32 || c as u32 == 127) {
        return Some(TagRejection::ControlCharacter);
    }
    if tag.trim() != tag {
        return Some(TagRejection::SurroundingWhitespace);
    }
    None
}

/// Cache of `dir -> (file name -> tags)`, populated on first demand.
///
/// Read failures are reported through the toast and yield empty results that
/// are not cached. Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct TagCache {
    store: Arc<dyn TagStore>,
    dirs: Arc<Mutex<LruCache<String, TagMap>>>,
    toast: Toast,
    limits: TagLimits,
}

impl TagCache {
    pub fn new(store: Arc<dyn TagStore>, toast: Toast, config: &TagConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            dirs: Arc::new(Mutex::new(LruCache::new(capacity))),
            toast,
            limits: TagLimits::from(config),
        }
    }

    pub fn limits(&self) -> TagLimits {
        self.limits
    }

    /// Tags of the file at `path`, empty if it has none
    pub async fn tags_for(&self, path: &str) -> Vec<String> {
        self.load_dir(dir_of(path))
            .await
            .get(name_of(path))
            .cloned()
            .unwrap_or_default()
    }

    /// Whole tag map of `dir`
    pub async fn load_dir(&self, dir: &str) -> TagMap {
        if let Some(map) = self.dirs.lock().get(dir) {
            return map.clone();
        }

        match self.store.load_dir(dir).await {
            Ok(map) => {
                tracing::debug!(dir, files = map.len(), "Tag directory loaded");
                self.dirs.lock().put(dir.to_string(), map.clone());
                map
            }
            Err(e) => {
                tracing::warn!(dir, error = %e, "Failed to load tags");
                let err = AppError::from(e);
                self.toast.show(err.user_message());
                TagMap::new()
            }
        }
    }

    /// Validate and persist `tags` for `path`, then update the cached entry.
    ///
    /// The cache is left untouched when validation or the store fails.
    pub async fn save(&self, path: &str, tags: &[String]) -> Result<()> {
        if let Err(e) = validate_tags(tags, self.limits) {
            tracing::debug!(path, error = %e, "Tag validation failed");
            self.toast.show(e.user_message());
            return Err(e);
        }

        let tags: Vec<String> = tags.iter().filter(|t| !t.is_empty()).cloned().collect();

        if let Err(e) = self.store.save(path, &tags).await {
            tracing::warn!(path, error = %e, "Failed to save tags");
            let err = AppError::from(e);
            self.toast.show(err.user_message());
            return Err(err);
        }

        {
            let mut dirs = self.dirs.lock();
            if let Some(map) = dirs.get_mut(dir_of(path)) {
                let name = name_of(path).to_string();
                if tags.is_empty() {
                    map.remove(&name);
                } else {
                    map.insert(name, tags);
                }
            }
        }

        tracing::info!(path, "Tags saved");
        self.toast.show("Tags saved");
        Ok(())
    }

    pub fn invalidate(&self, dir: &str) {
        self.dirs.lock().pop(dir);
    }

    pub fn invalidate_all(&self) {
        self.dirs.lock().clear();
    }

    /// Cached map of `dir` without loading or touching recency
    pub fn peek_dir(&self, dir: &str) -> Option<TagMap> {
        self.dirs.lock().peek(dir).cloned()
    }

    pub fn is_cached(&self, dir: &str) -> bool {
        self.dirs.lock().contains(dir)
    }

    /// Number of cached directories
    pub fn len(&self) -> usize {
        self.dirs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted union of every tag in the cached directories
    pub fn available_tags(&self) -> Vec<String> {
        let dirs = self.dirs.lock();
        let tags: BTreeSet<&String> = dirs
            .iter()
            .flat_map(|(_, map)| map.values().flatten())
            .collect();
        tags.into_iter().cloned().collect()
    }
}

impl std::fmt::Debug for TagCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagCache")
            .field("dirs", &self.dirs.lock().len())
            .field("limits", &self.limits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_fs::MemoryTagStore;

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn cache_with(store: Arc<MemoryTagStore>) -> (TagCache, Toast) {
        let toast = Toast::default();
        let cache = TagCache::new(store, toast.clone(), &TagConfig::default());
        (cache, toast)
    }

    #[test]
    fn test_validation_rules() {
        let limits = TagLimits::default();
        assert!(validate_tags(&strings(&["ok", "日本語", ""]), limits).is_ok());

        let reason = |tag: &str| match validate_tags(&strings(&[tag]), limits) {
            Err(AppError::InvalidTag { reason, .. }) => Some(reason),
            _ => None,
        };
        assert_eq!(reason(&"a".repeat(101)), Some(TagRejection::TooLong));
        assert_eq!(reason(&"あ".repeat(100)), None);
        assert_eq!(reason("a\tb"), Some(TagRejection::ForbiddenWhitespace));
        assert_eq!(reason("a\nb"), Some(TagRejection::ForbiddenWhitespace));
        assert_eq!(reason("a\u{7f}b"), Some(TagRejection::ControlCharacter));
        assert_eq!(reason("a\u{1}b"), Some(TagRejection::ControlCharacter));
        assert_eq!(reason(" a"), Some(TagRejection::SurroundingWhitespace));
        assert_eq!(reason("a "), Some(TagRejection::SurroundingWhitespace));
        assert_eq!(reason("a b"), None);
    }

    #[test]
    fn test_too_many_tags() {
        let tags: Vec<String> = (0..51).map(|i| format!("t{i}")).collect();
        assert!(matches!(
            validate_tags(&tags, TagLimits::default()),
            Err(AppError::TooManyTags { count: 51, max: 50 })
        ));
        assert!(validate_tags(&tags[..50], TagLimits::default()).is_ok());
    }

    #[tokio::test]
    async fn test_tags_for_loads_directory_once() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["x", "y"]);
        store.insert("/p/b.png", &["z"]);
        let (cache, _) = cache_with(store.clone());

        assert_eq!(cache.tags_for("/p/a.png").await, strings(&["x", "y"]));
        assert_eq!(cache.tags_for("/p/b.png").await, strings(&["z"]));
        assert!(cache.tags_for("/p/c.png").await.is_empty());
        assert_eq!(store.load_calls(), vec!["/p/".to_string()]);
        assert!(cache.is_cached("/p/"));
    }

    #[tokio::test]
    async fn test_load_failure_is_not_cached() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["x"]);
        store.set_fail_loads(true);
        let (cache, toast) = cache_with(store.clone());

        assert!(cache.tags_for("/p/a.png").await.is_empty());
        assert!(toast.is_visible());
        assert!(!cache.is_cached("/p/"));

        store.set_fail_loads(false);
        assert_eq!(cache.tags_for("/p/a.png").await, strings(&["x"]));
        assert_eq!(store.load_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_tag_leaves_cache_unchanged() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["old"]);
        let (cache, toast) = cache_with(store.clone());
        cache.load_dir("/p/").await;

        let err = cache
            .save("/p/a.png", &strings(&["ok", "bad\tname"]))
            .await
            .unwrap_err();
        match err {
            AppError::InvalidTag { tag, reason } => {
                assert_eq!(tag, "bad\tname");
                assert_eq!(reason, TagRejection::ForbiddenWhitespace);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(toast.is_visible());
        assert!(store.save_calls().is_empty());
        assert_eq!(cache.tags_for("/p/a.png").await, strings(&["old"]));
    }

    #[tokio::test]
    async fn test_save_writes_through_cached_directory() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["old"]);
        let (cache, toast) = cache_with(store.clone());
        cache.load_dir("/p/").await;

        cache.save("/p/a.png", &strings(&["new"])).await.unwrap();
        assert_eq!(toast.message(), "Tags saved");
        assert_eq!(cache.tags_for("/p/a.png").await, strings(&["new"]));
        assert_eq!(store.load_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_save_to_uncached_directory_creates_no_entry() {
        let store = Arc::new(MemoryTagStore::new());
        let (cache, _) = cache_with(store.clone());

        cache.save("/q/a.png", &strings(&["t"])).await.unwrap();
        assert!(!cache.is_cached("/q/"));
        assert_eq!(store.tags("/q/a.png"), Some(strings(&["t"])));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_error() {
        let store = Arc::new(MemoryTagStore::new());
        store.set_fail_saves(true);
        let (cache, toast) = cache_with(store.clone());

        let err = cache.save("/p/a.png", &strings(&["t"])).await.unwrap_err();
        assert!(matches!(err, AppError::StoreIo(_)));
        assert!(toast.message().starts_with("Storage error"));
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["x"]);
        store.insert("/q/b.png", &["y"]);
        let (cache, _) = cache_with(store.clone());

        cache.load_dir("/p/").await;
        cache.load_dir("/q/").await;
        assert_eq!(cache.available_tags(), strings(&["x", "y"]));

        cache.invalidate("/p/");
        assert!(!cache.is_cached("/p/"));
        cache.load_dir("/p/").await;
        assert_eq!(store.load_calls().len(), 3);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_lru_bound() {
        let store = Arc::new(MemoryTagStore::new());
        let config = TagConfig {
            cache_capacity: 2,
            ..TagConfig::default()
        };
        let cache = TagCache::new(store, Toast::default(), &config);

        cache.load_dir("/a/").await;
        cache.load_dir("/b/").await;
        cache.load_dir("/a/").await;
        cache.load_dir("/c/").await;

        assert_eq!(cache.len(), 2);
        assert!(cache.is_cached("/a/"));
        assert!(!cache.is_cached("/b/"));
    }
}
