//! Ordered image collection with cursor, tag filter and navigation history

use crate::config::{AppConfig, TransformConfig};
use crate::error::{AppError, Result};
use crate::history::History;
use crate::image_entry::{ImageEntry, Rotation};
use crate::observe::{Observers, SubscriptionId};
use crate::tag_cache::TagCache;
use app_fs::{dir_of, name_of, TagMap};
use futures::future::join_all;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

struct CollectionState {
    /// Insertion order, unique by path
    original: Vec<ImageEntry>,
    /// Indices into `original`; every index when no filter is active
    filtered: Vec<usize>,
    /// Position in `filtered`
    cursor: usize,
    /// Empty iff the filter is inactive
    filter_tags: BTreeSet<String>,
    /// Bumped by every filter change; in-flight filter loads compare against it
    filter_version: u64,
    global_rotation: Rotation,
    history: History,
}

impl CollectionState {
    fn len(&self) -> usize {
        self.filtered.len()
    }

    fn entry(&self, pos: usize) -> &ImageEntry {
        &self.original[self.filtered[pos]]
    }

    fn current(&self) -> Result<&ImageEntry> {
        if self.filtered.is_empty() {
            return Err(AppError::Empty);
        }
        Ok(self.entry(self.cursor))
    }

    fn position_of(&self, path: &str) -> Option<usize> {
        self.filtered
            .iter()
            .position(|&i| self.original[i].path() == path)
    }

    /// Move the cursor, optionally recording the jump in history
    fn jump(&mut self, target: usize, record: bool) -> bool {
        if target == self.cursor {
            return false;
        }
        if record {
            let from = self.entry(self.cursor).path().to_string();
            let to = self.entry(target).path().to_string();
            self.history.add(from, to);
        }
        self.cursor = target;
        true
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.len().saturating_sub(1));
    }

    fn is_filtered(&self) -> bool {
        !self.filter_tags.is_empty()
    }

    fn reset_unfiltered(&mut self) {
        self.filtered = (0..self.original.len()).collect();
    }

    /// Visible window `[cursor, min(cursor + count, len))`
    fn window_range(&self, count: usize) -> Range<usize> {
        if self.filtered.is_empty() {
            return 0..0;
        }
        self.cursor..self.cursor.saturating_add(count).min(self.len())
    }

    fn window_mut(&mut self, count: usize) -> impl Iterator<Item = &mut ImageEntry> + '_ {
        let range = self.window_range(count);
        let indices: HashSet<usize> = self.filtered[range].iter().copied().collect();
        self.original
            .iter_mut()
            .enumerate()
            .filter(move |(i, _)| indices.contains(i))
            .map(|(_, entry)| entry)
    }

    fn distinct_dirs<'a>(entries: impl Iterator<Item = &'a ImageEntry>) -> Vec<String> {
        let mut seen = HashSet::new();
        entries
            .map(|e| dir_of(e.path()))
            .filter(|dir| seen.insert(*dir))
            .map(str::to_string)
            .collect()
    }

    fn distinct_dirs_of_paths(paths: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        paths
            .iter()
            .map(|p| dir_of(p))
            .filter(|dir| seen.insert(*dir))
            .map(str::to_string)
            .collect()
    }

    /// Recompute `filtered` from `original` and the active filter tags.
    ///
    /// Directories missing from `maps` (added after the loads were started)
    /// are looked up in the cache without loading.
    fn apply_filter(&mut self, maps: &mut HashMap<String, TagMap>, cache: &TagCache) {
        for entry in &self.original {
            let dir = dir_of(entry.path());
            if !maps.contains_key(dir) {
                if let Some(map) = cache.peek_dir(dir) {
                    maps.insert(dir.to_string(), map);
                }
            }
        }

        let maps = &*maps;
        let filtered: Vec<usize> = self
            .original
            .iter()
            .enumerate()
            .filter(|(_, entry)| matches_any(entry.path(), maps, &self.filter_tags))
            .map(|(i, _)| i)
            .collect();
        self.filtered = filtered;
    }
}

impl CollectionState {
    /// Re-apply the active filter from the tags the cache already holds.
    ///
    /// Entries of directories no longer cached keep their current membership.
    fn refilter_cached(&mut self, cache: &TagCache) {
        let kept: HashSet<usize> = self.filtered.iter().copied().collect();
        let mut maps: HashMap<String, TagMap> = HashMap::new();
        for dir in Self::distinct_dirs(self.original.iter()) {
            if let Some(map) = cache.peek_dir(&dir) {
                maps.insert(dir, map);
            }
        }

        let filtered: Vec<usize> = self
            .original
            .iter()
            .enumerate()
            .filter(|(i, entry)| {
                if maps.contains_key(dir_of(entry.path())) {
                    matches_any(entry.path(), &maps, &self.filter_tags)
                } else {
                    kept.contains(i)
                }
            })
            .map(|(i, _)| i)
            .collect();
        self.filtered = filtered;
    }
}

/// OR semantics: the file carries at least one of `wanted`
fn matches_any(path: &str, maps: &HashMap<String, TagMap>, wanted: &BTreeSet<String>) -> bool {
    maps.get(dir_of(path))
        .and_then(|map| map.get(name_of(path)))
        .is_some_and(|tags| tags.iter().any(|t| wanted.contains(t)))
}

async fn load_tag_maps(cache: &TagCache, dirs: Vec<String>) -> HashMap<String, TagMap> {
    let maps = join_all(dirs.iter().map(|dir| cache.load_dir(dir))).await;
    dirs.into_iter().zip(maps).collect()
}

/// The image list the viewer navigates.
///
/// Entries live in `original`; the filtered view refers to them by index so
/// bookmark and transform state survive filter changes. Cloning yields
/// another handle to the same collection.
#[derive(Clone)]
pub struct Collection {
    state: Arc<Mutex<CollectionState>>,
    tags: Option<TagCache>,
    transform: TransformConfig,
    observers: Observers,
}

impl Collection {
    /// Create an empty collection. Tag filtering needs a `TagCache`.
    pub fn new(config: &AppConfig, tags: Option<TagCache>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CollectionState {
                original: Vec::new(),
                filtered: Vec::new(),
                cursor: 0,
                filter_tags: BTreeSet::new(),
                filter_version: 0,
                global_rotation: Rotation::None,
                history: History::with_capacity(config.navigation.history_capacity),
            })),
            tags,
            transform: config.transform,
            observers: Observers::new(),
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut CollectionState) -> R) -> R {
        let result = f(&mut self.state.lock());
        self.observers.notify();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&CollectionState) -> R) -> R {
        f(&self.state.lock())
    }

    // ===== Mutation =====

    /// Append paths not already present. Returns the number of new entries.
    ///
    /// With a filter active the filter is re-applied once the tags of the
    /// collection's directories are available.
    pub async fn add<I, S>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (added, refresh) = self.mutate(|state| {
            let mut known: HashSet<String> =
                state.original.iter().map(|e| e.path().to_string()).collect();
            let mut added = 0;
            for path in paths {
                let path = path.into();
                if known.insert(path.clone()) {
                    state.original.push(ImageEntry::new(path));
                    added += 1;
                }
            }

            let refresh = if !state.is_filtered() {
                state.reset_unfiltered();
                None
            } else if added > 0 {
                Some((
                    state.filter_version,
                    CollectionState::distinct_dirs(state.original.iter()),
                ))
            } else {
                None
            };
            state.clamp_cursor();
            (added, refresh)
        });

        if added > 0 {
            tracing::info!(added, "Images added");
        }

        if let (Some((version, dirs)), Some(cache)) = (refresh, &self.tags) {
            let mut maps = load_tag_maps(cache, dirs).await;
            self.mutate(|state| {
                if state.filter_version == version && state.is_filtered() {
                    state.apply_filter(&mut maps, cache);
                    state.clamp_cursor();
                }
            });
        }

        added
    }

    /// Remove the entry under the cursor and return it
    pub fn delete_current(&self) -> Result<ImageEntry> {
        let removed = {
            let mut state = self.state.lock();
            if state.filtered.is_empty() {
                return Err(AppError::Empty);
            }

            let index = state.filtered[state.cursor];
            let removed = state.original.remove(index);
            state.filtered.retain(|&i| i != index);
            for i in state.filtered.iter_mut() {
                if *i > index {
                    *i -= 1;
                }
            }
            if state.is_filtered() {
                if let Some(cache) = &self.tags {
                    state.refilter_cached(cache);
                }
            }
            state.clamp_cursor();
            removed
        };

        tracing::info!(path = removed.path(), "Image removed from collection");
        self.observers.notify();
        Ok(removed)
    }

    // ===== Cursor navigation =====

    /// Advance by `step`. Wraps only when already on the last entry.
    pub fn next(&self, step: usize) {
        self.mutate(|state| {
            let len = state.len();
            if len == 0 {
                return;
            }
            state.cursor = if state.cursor >= len - 1 {
                0
            } else {
                state.cursor.saturating_add(step.max(1)).min(len - 1)
            };
        });
    }

    /// Go back by `step`. Wraps only when already on the first entry.
    pub fn prev(&self, step: usize) {
        self.mutate(|state| {
            let len = state.len();
            if len == 0 {
                return;
            }
            state.cursor = if state.cursor == 0 {
                len - 1
            } else {
                state.cursor.saturating_sub(step.max(1))
            };
        });
    }

    /// Jump to a uniformly chosen entry other than the current one
    pub fn random(&self) -> bool {
        self.mutate(|state| {
            let len = state.len();
            if len <= 1 {
                return false;
            }
            let mut target = rand::rng().random_range(0..len - 1);
            if target >= state.cursor {
                target += 1;
            }
            state.jump(target, true)
        })
    }

    /// Jump to the 1-based position `k`, clamped into the collection
    pub fn goto_1based(&self, k: usize) -> bool {
        self.mutate(|state| {
            let len = state.len();
            if len == 0 {
                return false;
            }
            let target = k.clamp(1, len) - 1;
            state.jump(target, true)
        })
    }

    /// Move to the next bookmarked entry after the cursor, wrapping around
    pub fn next_bookmark(&self) -> bool {
        self.mutate(|state| {
            let len = state.len();
            let found = (1..len)
                .map(|offset| (state.cursor + offset) % len)
                .find(|&pos| state.entry(pos).is_bookmarked());
            match found {
                Some(pos) => state.jump(pos, false),
                None => false,
            }
        })
    }

    /// Walk history backwards to the first origin still in the filtered list
    pub fn prev_history(&self) -> bool {
        self.mutate(|state| {
            while let Some(path) = state.history.prev_path() {
                if let Some(pos) = state.position_of(&path) {
                    state.cursor = pos;
                    return true;
                }
            }
            false
        })
    }

    /// Walk history forwards to the first destination still in the filtered list
    pub fn next_history(&self) -> bool {
        self.mutate(|state| {
            while let Some(path) = state.history.next_path() {
                if let Some(pos) = state.position_of(&path) {
                    state.cursor = pos;
                    return true;
                }
            }
            false
        })
    }

    // ===== Transforms =====

    pub fn rotate_visible_local_right(&self, visible_count: usize) {
        self.mutate(|state| state.window_mut(visible_count).for_each(ImageEntry::rotate_local_right));
    }

    pub fn rotate_visible_local_left(&self, visible_count: usize) {
        self.mutate(|state| state.window_mut(visible_count).for_each(ImageEntry::rotate_local_left));
    }

    pub fn scale_visible_up(&self, visible_count: usize) {
        let limits = self.transform;
        self.mutate(|state| state.window_mut(visible_count).for_each(|e| e.scale_up(&limits)));
    }

    pub fn scale_visible_down(&self, visible_count: usize) {
        let limits = self.transform;
        self.mutate(|state| state.window_mut(visible_count).for_each(|e| e.scale_down(&limits)));
    }

    pub fn reset_visible_transform(&self, visible_count: usize) {
        self.mutate(|state| state.window_mut(visible_count).for_each(ImageEntry::reset_transform));
    }

    pub fn translate_visible(&self, visible_count: usize, dx: f32, dy: f32) {
        self.mutate(|state| {
            state
                .window_mut(visible_count)
                .for_each(|e| e.translate(dx, dy))
        });
    }

    pub fn rotate_global_right(&self) {
        self.mutate(|state| state.global_rotation = state.global_rotation.rotate_cw());
    }

    pub fn rotate_global_left(&self) {
        self.mutate(|state| state.global_rotation = state.global_rotation.rotate_ccw());
    }

    pub fn global_rotation(&self) -> Rotation {
        self.read(|state| state.global_rotation)
    }

    /// Rotation to draw `entry` with: global plus local
    pub fn display_rotation(&self, entry: &ImageEntry) -> Rotation {
        self.global_rotation().compose(entry.local_rotation())
    }

    // ===== Bookmarks =====

    /// Flip the bookmark of the current entry and return the new flag
    pub fn toggle_bookmark_current(&self) -> Result<bool> {
        let bookmarked = {
            let mut state = self.state.lock();
            if state.filtered.is_empty() {
                return Err(AppError::Empty);
            }
            let index = state.filtered[state.cursor];
            let entry = &mut state.original[index];
            entry.toggle_bookmark();
            entry.is_bookmarked()
        };
        self.observers.notify();
        Ok(bookmarked)
    }

    /// Bookmarked entries in the filtered list
    pub fn count_bookmarked(&self) -> usize {
        self.read(|state| {
            state
                .filtered
                .iter()
                .filter(|&&i| state.original[i].is_bookmarked())
                .count()
        })
    }

    // ===== Filter =====

    /// Show only entries carrying at least one of `tags`.
    ///
    /// An empty list clears the filter. When a newer filter change happens
    /// while the tags are loading, this call's result is discarded.
    pub async fn apply_tag_filter(&self, tags: &[String]) -> Result<()> {
        if tags.iter().all(|t| t.is_empty()) {
            self.clear_filter();
            return Ok(());
        }
        let cache = self.tags.as_ref().ok_or(AppError::NoFilter)?;

        let (version, dirs) = {
            let mut state = self.state.lock();
            state.filter_version += 1;
            (
                state.filter_version,
                CollectionState::distinct_dirs(state.original.iter()),
            )
        };

        tracing::debug!(version, dirs = dirs.len(), "Loading tags for filter");
        let mut maps = load_tag_maps(cache, dirs).await;

        let applied = self.mutate(|state| {
            if state.filter_version != version {
                return false;
            }
            state.filter_tags = tags.iter().filter(|t| !t.is_empty()).cloned().collect();
            state.apply_filter(&mut maps, cache);
            state.cursor = 0;
            true
        });

        if applied {
            tracing::info!(tags = ?tags, matched = self.len(), "Tag filter applied");
        } else {
            tracing::debug!(version, "Discarding stale filter result");
        }
        Ok(())
    }

    pub fn clear_filter(&self) {
        self.mutate(|state| {
            state.filter_version += 1;
            state.filter_tags.clear();
            state.reset_unfiltered();
            state.cursor = 0;
        });
        tracing::debug!("Tag filter cleared");
    }

    pub fn is_filtered(&self) -> bool {
        self.read(CollectionState::is_filtered)
    }

    /// Active filter tags, sorted
    pub fn filter_tags(&self) -> Vec<String> {
        self.read(|state| state.filter_tags.iter().cloned().collect())
    }

    /// Sorted union of the tags of every filtered entry
    pub async fn available_tags(&self) -> Vec<String> {
        let Some(cache) = &self.tags else {
            return Vec::new();
        };

        let paths: Vec<String> = self.read(|state| {
            state
                .filtered
                .iter()
                .map(|&i| state.original[i].path().to_string())
                .collect()
        });
        let dirs = CollectionState::distinct_dirs_of_paths(&paths);
        let maps = load_tag_maps(cache, dirs).await;

        let tags: BTreeSet<&String> = paths
            .iter()
            .filter_map(|p| maps.get(dir_of(p)).and_then(|map| map.get(name_of(p))))
            .flatten()
            .collect();
        tags.into_iter().cloned().collect()
    }

    // ===== Queries =====

    /// Snapshot of the entry under the cursor
    pub fn current(&self) -> Result<ImageEntry> {
        self.read(|state| state.current().cloned())
    }

    pub fn current_path(&self) -> Result<String> {
        self.read(|state| state.current().map(|e| e.path().to_string()))
    }

    /// Snapshot of the visible window starting at the cursor
    pub fn window(&self, count: usize) -> Result<Vec<ImageEntry>> {
        if count < 1 {
            return Err(AppError::InvalidCount(count));
        }
        self.read(|state| {
            if state.filtered.is_empty() {
                return Err(AppError::Empty);
            }
            Ok(state
                .window_range(count)
                .map(|pos| state.entry(pos).clone())
                .collect())
        })
    }

    /// Cursor position in the filtered list
    pub fn cursor(&self) -> usize {
        self.read(|state| state.cursor)
    }

    /// Number of filtered entries
    pub fn len(&self) -> usize {
        self.read(CollectionState::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries regardless of the filter
    pub fn total_len(&self) -> usize {
        self.read(|state| state.original.len())
    }

    /// Paths of the filtered list, in order
    pub fn paths(&self) -> Vec<String> {
        self.read(|state| {
            state
                .filtered
                .iter()
                .map(|&i| state.original[i].path().to_string())
                .collect()
        })
    }

    /// Paths of every entry, in insertion order
    pub fn original_paths(&self) -> Vec<String> {
        self.read(|state| state.original.iter().map(|e| e.path().to_string()).collect())
    }

    /// Position of `path` in the filtered list
    pub fn position_of(&self, path: &str) -> Option<usize> {
        self.read(|state| state.position_of(path))
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Collection")
            .field("total", &state.original.len())
            .field("filtered", &state.filtered.len())
            .field("cursor", &state.cursor)
            .field("filter_tags", &state.filter_tags)
            .finish()
    }
}
