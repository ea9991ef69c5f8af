//! Modal dialog controllers

use super::tag_editor::TagEditor;
use app_core::{Collection, Observers, SubscriptionId};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Receives the confirm dialog's answer
pub type ConfirmCallback = Box<dyn FnOnce(bool) -> BoxFuture<'static, ()> + Send>;

/// Receives the goto dialog's 1-based index, `None` when cancelled or unparsable
pub type GotoCallback = Box<dyn FnOnce(Option<usize>) + Send>;

/// Yes/no question with a single pending callback
#[derive(Default)]
pub struct ConfirmDialog {
    message: String,
    callback: Option<ConfirmCallback>,
}

impl ConfirmDialog {
    /// Show `message`. A confirm already open is replaced and its callback dropped.
    pub fn open(&mut self, message: impl Into<String>, callback: ConfirmCallback) {
        if self.callback.is_some() {
            tracing::warn!("Confirm dialog pre-empted: {}", self.message);
        }
        self.message = message.into();
        self.callback = Some(callback);
    }

    /// Close the dialog and hand out its callback
    pub fn take(&mut self) -> Option<ConfirmCallback> {
        self.message.clear();
        self.callback.take()
    }

    pub fn is_open(&self) -> bool {
        self.callback.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.is_open().then_some(self.message.as_str())
    }
}

/// Index entry dialog bounded by `max_index`
#[derive(Default)]
pub struct GotoDialog {
    max_index: usize,
    value: String,
    callback: Option<GotoCallback>,
}

impl GotoDialog {
    pub fn open(&mut self, max_index: usize, callback: GotoCallback) {
        if self.callback.is_some() {
            tracing::warn!("Goto dialog reopened while open");
        }
        self.max_index = max_index;
        self.value.clear();
        self.callback = Some(callback);
    }

    /// Parse `text` into a 1-based index clamped into `1..=max_index`.
    ///
    /// Only the leading integer counts, so `"3a"` reads as 3. Text without
    /// leading digits yields `None`.
    pub fn parse(text: &str, max_index: usize) -> Option<usize> {
        let text = text.trim();
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        // Too many digits for usize still means "past the end"
        let value = rest[..digits].parse::<usize>().unwrap_or(usize::MAX);
        let value = if negative { 1 } else { value.max(1) };
        Some(value.min(max_index))
    }

    /// Close the dialog, returning the callback and the value to deliver
    pub fn submit(&mut self, text: &str) -> Option<(GotoCallback, Option<usize>)> {
        let callback = self.callback.take()?;
        let value = Self::parse(text, self.max_index);
        self.value.clear();
        Some((callback, value))
    }

    pub fn cancel(&mut self) -> Option<GotoCallback> {
        self.value.clear();
        self.callback.take()
    }

    pub fn set_value(&mut self, text: impl Into<String>) {
        self.value = text.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_open(&self) -> bool {
        self.callback.is_some()
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPhase {
    #[default]
    Closed,
    /// Waiting for the available tags; already counts as open
    Loading,
    Open,
}

/// Tag filter selection
#[derive(Debug, Default)]
pub struct FilterDialog {
    phase: FilterPhase,
    generation: u64,
    available: Vec<String>,
    selected: BTreeSet<String>,
}

impl FilterDialog {
    /// Enter the loading phase. Returns the generation to finish with.
    pub fn begin_open(&mut self) -> u64 {
        self.generation += 1;
        self.phase = FilterPhase::Loading;
        self.available.clear();
        self.selected.clear();
        self.generation
    }

    /// Show the loaded tags unless the dialog was closed or reopened meanwhile
    pub fn finish_open(&mut self, generation: u64, available: Vec<String>) -> bool {
        if self.phase != FilterPhase::Loading || self.generation != generation {
            return false;
        }
        self.available = available;
        self.phase = FilterPhase::Open;
        true
    }

    /// Toggle `tag` in the selection. Returns whether it is now selected.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if self.phase != FilterPhase::Open {
            return false;
        }
        if !self.selected.remove(tag) {
            self.selected.insert(tag.to_string());
            return true;
        }
        false
    }

    /// Close and return the selection, or `None` if the dialog was not showing tags
    pub fn take_selection(&mut self) -> Option<Vec<String>> {
        if self.phase != FilterPhase::Open {
            return None;
        }
        self.phase = FilterPhase::Closed;
        self.generation += 1;
        Some(std::mem::take(&mut self.selected).into_iter().collect())
    }

    pub fn cancel(&mut self) {
        if self.phase != FilterPhase::Closed {
            self.generation += 1;
        }
        self.phase = FilterPhase::Closed;
        self.selected.clear();
    }

    pub fn is_open(&self) -> bool {
        self.phase != FilterPhase::Closed
    }

    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }
}

/// Every modal the viewer can show
#[derive(Default)]
pub struct DialogState {
    pub confirm: ConfirmDialog,
    pub goto: GotoDialog,
    pub filter: FilterDialog,
    pub editor: TagEditor,
}

impl DialogState {
    pub fn any_open(&self) -> bool {
        self.confirm.is_open() || self.goto.is_open() || self.filter.is_open() || self.editor.is_open()
    }
}

/// Shared handle to the dialogs.
///
/// Callbacks are always invoked after the internal lock is released.
#[derive(Clone, Default)]
pub struct Dialogs {
    state: Arc<Mutex<DialogState>>,
    observers: Observers,
}

impl Dialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate dialog state and notify listeners
    pub fn update<R>(&self, f: impl FnOnce(&mut DialogState) -> R) -> R {
        let result = f(&mut self.state.lock());
        self.observers.notify();
        result
    }

    pub fn read<R>(&self, f: impl FnOnce(&DialogState) -> R) -> R {
        f(&self.state.lock())
    }

    /// True while any dialog or the tag editor is open
    pub fn any_open(&self) -> bool {
        self.read(DialogState::any_open)
    }

    // ===== Confirm =====

    pub fn open_confirm(&self, message: impl Into<String>, callback: ConfirmCallback) {
        let message = message.into();
        tracing::debug!("Confirm: {}", message);
        self.update(|s| s.confirm.open(message, callback));
    }

    /// Close the confirm dialog and run its callback. Returns false if none was open.
    pub async fn resolve_confirm(&self, accepted: bool) -> bool {
        let Some(callback) = self.update(|s| s.confirm.take()) else {
            return false;
        };
        callback(accepted).await;
        true
    }

    pub fn confirm_message(&self) -> Option<String> {
        self.read(|s| s.confirm.message().map(str::to_string))
    }

    // ===== Goto =====

    pub fn open_goto(&self, max_index: usize, callback: GotoCallback) {
        self.update(|s| s.goto.open(max_index, callback));
    }

    /// Submit `text`; returns the index delivered to the callback
    pub fn submit_goto(&self, text: &str) -> Option<usize> {
        let (callback, value) = self.update(|s| s.goto.submit(text))?;
        tracing::debug!("Goto {:?} -> {:?}", text, value);
        callback(value);
        value
    }

    pub fn cancel_goto(&self) {
        if let Some(callback) = self.update(|s| s.goto.cancel()) {
            callback(None);
        }
    }

    pub fn set_goto_value(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.goto.set_value(text));
    }

    pub fn goto_value(&self) -> String {
        self.read(|s| s.goto.value().to_string())
    }

    pub fn goto_max(&self) -> Option<usize> {
        self.read(|s| s.goto.is_open().then(|| s.goto.max_index()))
    }

    // ===== Filter =====

    pub fn begin_filter_open(&self) -> u64 {
        self.update(|s| s.filter.begin_open())
    }

    /// Load the tags of the filtered images and show them if the dialog is still waiting
    pub async fn load_filter_tags(&self, generation: u64, collection: &Collection) -> bool {
        let tags = collection.available_tags().await;
        let shown = self.update(|s| s.filter.finish_open(generation, tags));
        if !shown {
            tracing::debug!("Filter dialog closed before its tags arrived");
        }
        shown
    }

    pub async fn open_filter(&self, collection: &Collection) -> bool {
        let generation = self.begin_filter_open();
        self.load_filter_tags(generation, collection).await
    }

    pub fn toggle_filter_tag(&self, tag: &str) -> bool {
        self.update(|s| s.filter.toggle(tag))
    }

    /// Close the dialog, then apply the selection to `collection`
    pub async fn execute_filter(&self, collection: &Collection) -> app_core::Result<bool> {
        let Some(tags) = self.update(|s| s.filter.take_selection()) else {
            return Ok(false);
        };
        collection.apply_tag_filter(&tags).await?;
        Ok(true)
    }

    pub fn cancel_filter(&self) {
        self.update(|s| s.filter.cancel());
    }

    pub fn filter_phase(&self) -> FilterPhase {
        self.read(|s| s.filter.phase())
    }

    pub fn filter_available(&self) -> Vec<String> {
        self.read(|s| s.filter.available().to_vec())
    }

    pub fn filter_selected(&self) -> Vec<String> {
        self.read(|s| s.filter.selected().iter().cloned().collect())
    }

    // ===== Tag editor =====

    pub fn is_editor_open(&self) -> bool {
        self.read(|s| s.editor.is_open())
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

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{AppConfig, TagCache, Toast};
    use app_fs::MemoryTagStore;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_confirm_invokes_callback_once() {
        let dialogs = Dialogs::new();
        let answers = Arc::new(Mutex::new(Vec::new()));
        {
            let answers = answers.clone();
            dialogs.open_confirm(
                "Delete?",
                Box::new(move |accepted| {
                    async move {
                        answers.lock().push(accepted);
                    }
                    .boxed()
                }),
            );
        }
        assert!(dialogs.any_open());
        assert_eq!(dialogs.confirm_message().as_deref(), Some("Delete?"));

        assert!(dialogs.resolve_confirm(false).await);
        assert!(!dialogs.resolve_confirm(true).await);
        assert_eq!(*answers.lock(), vec![false]);
        assert!(!dialogs.any_open());
    }

    #[tokio::test]
    async fn test_confirm_preemption_drops_first_callback() {
        let dialogs = Dialogs::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let calls = calls.clone();
            dialogs.open_confirm(
                "?",
                Box::new(move |_| {
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                    }
                    .boxed()
                }),
            );
        }
        dialogs.resolve_confirm(true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_goto_parse() {
        assert_eq!(GotoDialog::parse("0", 5), Some(1));
        assert_eq!(GotoDialog::parse("-3", 5), Some(1));
        assert_eq!(GotoDialog::parse(" 3 ", 5), Some(3));
        assert_eq!(GotoDialog::parse("99", 5), Some(5));
        assert_eq!(GotoDialog::parse("abc", 5), None);
        assert_eq!(GotoDialog::parse("", 5), None);
        assert_eq!(GotoDialog::parse("3a", 5), Some(3));
        assert_eq!(GotoDialog::parse("+2", 5), Some(2));
        assert_eq!(GotoDialog::parse("99999999999999999999999", 5), Some(5));
        assert_eq!(GotoDialog::parse("-", 5), None);
    }

    #[test]
    fn test_goto_cancel_delivers_none() {
        let dialogs = Dialogs::new();
        let result = Arc::new(Mutex::new(Some(Some(0))));
        {
            let result = result.clone();
            dialogs.open_goto(5, Box::new(move |v| *result.lock() = Some(v)));
        }
        assert_eq!(dialogs.goto_max(), Some(5));
        dialogs.cancel_goto();
        assert_eq!(*result.lock(), Some(None));
        assert!(!dialogs.any_open());
        assert_eq!(dialogs.submit_goto("2"), None);
    }

    #[tokio::test]
    async fn test_filter_lifecycle() {
        let store = Arc::new(MemoryTagStore::new());
        store.insert("/p/a.png", &["cat"]);
        store.insert("/p/b.png", &["dog"]);
        let config = AppConfig::default();
        let cache = TagCache::new(store, Toast::default(), &config.tags);
        let collection = Collection::new(&config, Some(cache));
        collection.add(["/p/a.png", "/p/b.png"]).await;

        let dialogs = Dialogs::new();
        assert!(dialogs.open_filter(&collection).await);
        assert_eq!(dialogs.filter_available(), vec!["cat".to_string(), "dog".to_string()]);

        assert!(dialogs.toggle_filter_tag("dog"));
        assert!(dialogs.toggle_filter_tag("cat"));
        assert!(!dialogs.toggle_filter_tag("cat"));

        assert!(dialogs.execute_filter(&collection).await.unwrap());
        assert!(!dialogs.any_open());
        assert_eq!(collection.paths(), vec!["/p/b.png".to_string()]);
    }

    #[test]
    fn test_cancelled_filter_ignores_late_tags() {
        let mut filter = FilterDialog::default();
        let generation = filter.begin_open();
        assert!(filter.is_open());
        filter.cancel();
        assert!(!filter.finish_open(generation, vec!["x".to_string()]));
        assert_eq!(filter.phase(), FilterPhase::Closed);
        assert_eq!(filter.take_selection(), None);
    }
}
