//! Executes operations against the viewer state

use crate::components::{Dialogs, EditorAction, StatusInfo};
use crate::input::{InputRouter, Modifier, RawInput};
use app_core::{
    name_of, AppConfig, AppError, Collection, EditMode, GridLayout, Operation, Result, TagCache,
    Toast,
};
use app_fs::{FileSink, TagStore};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use winit::keyboard::ModifiersState;

/// Owns the viewer state and turns input into effects on it
pub struct Controller {
    jump_step: usize,
    collection: Collection,
    tags: TagCache,
    dialogs: Dialogs,
    grid: GridLayout,
    edit_mode: EditMode,
    toast: Toast,
    info_overlay: Arc<AtomicBool>,
    sink: Arc<dyn FileSink>,
    router: Mutex<InputRouter>,
    /// Background continuations of operations with suspension points
    tasks: Mutex<Vec<JoinHandle<()>>>,
    overlay_observers: app_core::Observers,
}

impl Controller {
    pub fn new(config: &AppConfig, store: Arc<dyn TagStore>, sink: Arc<dyn FileSink>) -> Self {
        let toast = Toast::new(Duration::from_millis(config.toast.duration_ms));
        let tags = TagCache::new(store, toast.clone(), &config.tags);
        let collection = Collection::new(config, Some(tags.clone()));

        Self {
            jump_step: config.navigation.jump_step.max(1),
            collection,
            tags,
            dialogs: Dialogs::new(),
            grid: GridLayout::new(&config.grid),
            edit_mode: EditMode::new(),
            toast,
            info_overlay: Arc::new(AtomicBool::new(false)),
            sink,
            router: Mutex::new(InputRouter::new(&config.keybindings)),
            tasks: Mutex::new(Vec::new()),
            overlay_observers: app_core::Observers::new(),
        }
    }

    // ===== Input =====

    /// Dispatch a key press or pseudo-key.
    ///
    /// Returns the executed operation. While the tag editor is open it
    /// receives every non-modifier key instead.
    pub fn handle_input(&self, input: RawInput) -> Option<Operation> {
        if !matches!(input, RawInput::Modifier(_)) && self.dialogs.is_editor_open() {
            self.editor_key_down(&input);
            return None;
        }

        let gated = self.dialogs.any_open();
        let edit_mode = self.edit_mode.active();
        let op = self.router.lock().resolve(&input, edit_mode, gated)?;

        if let Err(e) = self.execute(op) {
            self.report(op, e);
        }
        Some(op)
    }

    /// Handle a key release
    pub fn key_up(&self, input: &RawInput) {
        if matches!(input, RawInput::Modifier(_)) {
            self.router.lock().release(input);
        } else if self.dialogs.is_editor_open() {
            self.editor_key_up();
        }
    }

    pub fn modifier_down(&self, modifier: Modifier) {
        self.router.lock().down(modifier);
    }

    pub fn modifier_up(&self, modifier: Modifier) {
        self.router.lock().up(modifier);
    }

    pub fn reset_modifiers(&self) {
        self.router.lock().reset();
    }

    pub fn sync_modifiers(&self, state: ModifiersState) {
        self.router.lock().sync_modifiers(state);
    }

    fn report(&self, op: Operation, err: AppError) {
        if err.is_programming_error() {
            tracing::debug!("{} skipped: {}", op, err);
        } else {
            tracing::warn!("{} failed: {}", op, err);
            self.toast.show(err.user_message());
        }
    }

    // ===== Operations =====

    /// Run `op`. Operations that wait on the tag store enter their
    /// in-progress state here and finish on a background task.
    pub fn execute(&self, op: Operation) -> Result<()> {
        tracing::debug!("Executing {}", op);
        let visible = self.grid.cells();

        match op {
            Operation::Next => self.collection.next(1),
            Operation::Prev => self.collection.prev(1),
            Operation::NextJump => self.collection.next(self.jump_step),
            Operation::PrevJump => self.collection.prev(self.jump_step),
            Operation::Random => {
                self.collection.random();
            }
            Operation::NextBookmark => {
                self.collection.next_bookmark();
            }
            Operation::PrevHistory => {
                self.collection.prev_history();
            }
            Operation::NextHistory => {
                self.collection.next_history();
            }

            Operation::ToggleBookmark => self.toggle_bookmark()?,
            Operation::DeleteWithConfirm => self.delete_with_confirm()?,

            Operation::RowsIncrement => self.grid.rows_increment(),
            Operation::RowsDecrement => self.grid.rows_decrement(),
            Operation::ColsIncrement => self.grid.cols_increment(),
            Operation::ColsDecrement => self.grid.cols_decrement(),

            Operation::OpenTagEditor => self.open_tag_editor()?,
            Operation::ToggleInfoOverlay => {
                let shown = !self.info_overlay.fetch_xor(true, Ordering::SeqCst);
                tracing::debug!(shown, "Info overlay toggled");
                self.overlay_observers.notify();
            }
            Operation::OpenGoto => self.open_goto(),
            Operation::OpenFilter => self.open_filter(),

            Operation::RotateGlobalRight => self.collection.rotate_global_right(),
            Operation::RotateGlobalLeft => self.collection.rotate_global_left(),
            Operation::RotateVisibleLocalRight => self.collection.rotate_visible_local_right(visible),
            Operation::RotateVisibleLocalLeft => self.collection.rotate_visible_local_left(visible),

            Operation::EnterEditMode => self.edit_mode.enter(),
            Operation::ExitEditMode => self.edit_mode.exit(),
            Operation::ResetVisibleTransform => self.collection.reset_visible_transform(visible),
            Operation::ScaleVisibleUp => self.collection.scale_visible_up(visible),
            Operation::ScaleVisibleDown => self.collection.scale_visible_down(visible),
        }
        Ok(())
    }

    fn toggle_bookmark(&self) -> Result<()> {
        let was_bookmarked = self.collection.current()?.is_bookmarked();
        let count = self.collection.count_bookmarked();

        let message = if was_bookmarked {
            format!("Bookmark removed ({})", count.saturating_sub(1))
        } else {
            format!("Bookmarked ({})", count + 1)
        };
        self.toast.show(message);

        self.collection.toggle_bookmark_current()?;
        Ok(())
    }

    fn delete_with_confirm(&self) -> Result<()> {
        let path = self.collection.current_path()?;
        let message = format!("Delete \"{}\"?", name_of(&path));

        let collection = self.collection.clone();
        let sink = self.sink.clone();
        let toast = self.toast.clone();
        self.dialogs.open_confirm(
            message,
            Box::new(move |accepted| {
                async move {
                    if accepted {
                        delete_confirmed(collection, sink, toast, path).await;
                    } else {
                        tracing::debug!("Delete cancelled: {}", path);
                    }
                }
                .boxed()
            }),
        );
        Ok(())
    }

    fn open_goto(&self) {
        let collection = self.collection.clone();
        let max_index = collection.len();
        self.dialogs.open_goto(
            max_index,
            Box::new(move |index| {
                if let Some(k) = index {
                    collection.goto_1based(k);
                }
            }),
        );
    }

    fn open_filter(&self) {
        let generation = self.dialogs.begin_filter_open();
        let dialogs = self.dialogs.clone();
        let collection = self.collection.clone();
        self.spawn(async move {
            dialogs.load_filter_tags(generation, &collection).await;
        });
    }

    fn open_tag_editor(&self) -> Result<()> {
        let path = self.collection.current_path()?;
        let generation = self.dialogs.update(|s| s.editor.begin_open(path.clone()));

        let dialogs = self.dialogs.clone();
        let cache = self.tags.clone();
        self.spawn(async move {
            let tags = cache.tags_for(&path).await;
            let available = cache.available_tags();
            dialogs.update(|s| s.editor.finish_open(generation, tags, available));
        });
        Ok(())
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(task);
                let mut tasks = self.tasks.lock();
                tasks.retain(|t| !t.is_finished());
                tasks.push(handle);
            }
            Err(_) => tracing::error!("No async runtime; background operation dropped"),
        }
    }

    /// Wait until every background continuation has finished
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.tasks.lock());
            if pending.is_empty() {
                break;
            }
            for task in pending {
                if let Err(e) = task.await {
                    tracing::error!("Background operation failed: {}", e);
                }
            }
        }
    }

    // ===== Dialogs =====

    /// Answer the confirm dialog
    pub async fn confirm(&self, accepted: bool) -> bool {
        self.dialogs.resolve_confirm(accepted).await
    }

    pub fn submit_goto(&self, text: &str) -> Option<usize> {
        self.dialogs.submit_goto(text)
    }

    pub fn cancel_goto(&self) {
        self.dialogs.cancel_goto();
    }

    pub fn toggle_filter_tag(&self, tag: &str) -> bool {
        self.dialogs.toggle_filter_tag(tag)
    }

    /// Close the filter dialog and apply its selection
    pub async fn execute_filter(&self) -> Result<bool> {
        self.dialogs.execute_filter(&self.collection).await
    }

    pub fn cancel_filter(&self) {
        self.dialogs.cancel_filter();
    }

    // ===== Tag editor =====

    pub fn editor_key_down(&self, input: &RawInput) -> EditorAction {
        let action = self.dialogs.update(|s| s.editor.key_down(input));
        match &action {
            EditorAction::Save(tags) => self.save_editor_tags(tags.clone()),
            EditorAction::Cancel => self.editor_cancel(),
            EditorAction::None => {}
        }
        action
    }

    pub fn editor_key_up(&self) {
        self.dialogs.update(|s| s.editor.key_up());
    }

    pub fn editor_set_text(&self, text: &str) {
        self.dialogs.update(|s| s.editor.set_text(text));
    }

    pub fn editor_toggle_chip(&self, tag: &str) -> bool {
        self.dialogs.update(|s| s.editor.toggle_chip(tag))
    }

    pub fn editor_focus_text(&self) {
        self.dialogs.update(|s| s.editor.focus_text());
    }

    /// Save what the editor currently shows
    pub fn editor_save(&self) {
        let tags = self.dialogs.read(|s| s.editor.pending_tags());
        self.save_editor_tags(tags);
    }

    /// Close without saving (Escape or a click outside the editor)
    pub fn editor_cancel(&self) {
        self.dialogs.update(|s| s.editor.close());
    }

    /// The editor closes once the store accepted the tags; on error it stays open.
    fn save_editor_tags(&self, tags: Vec<String>) {
        let (open, path, generation) = self.dialogs.read(|s| {
            (
                s.editor.is_open() && !s.editor.is_loading(),
                s.editor.path().to_string(),
                s.editor.generation(),
            )
        });
        if !open {
            return;
        }

        let dialogs = self.dialogs.clone();
        let cache = self.tags.clone();
        self.spawn(async move {
            match cache.save(&path, &tags).await {
                Ok(()) => {
                    dialogs.update(|s| s.editor.close_if(generation));
                }
                Err(e) => tracing::debug!("Tag editor kept open: {}", e),
            }
        });
    }

    // ===== Host entry points =====

    /// Add dropped files and directories. Returns the number of new images.
    pub async fn drop_paths<I, S>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let images = app_fs::extract_image_paths(paths);
        if images.is_empty() {
            self.toast.show("No images found");
            return 0;
        }
        self.collection.add(images).await
    }

    /// Move the visible images while in edit mode
    pub fn drag(&self, dx: f32, dy: f32) {
        if self.edit_mode.active() {
            self.collection.translate_visible(self.grid.cells(), dx, dy);
        }
    }

    pub fn status(&self) -> StatusInfo {
        let current = self.collection.current().ok();
        let position = if current.is_some() {
            self.collection.cursor() + 1
        } else {
            0
        };

        StatusInfo {
            path: current.as_ref().map(|e| e.path().to_string()),
            file_name: current
                .as_ref()
                .map(|e| name_of(e.path()).to_string())
                .unwrap_or_default(),
            position,
            count: self.collection.len(),
            total: self.collection.total_len(),
            filtered: self.collection.is_filtered(),
            bookmarked: current.as_ref().is_some_and(|e| e.is_bookmarked()),
            bookmarks: self.collection.count_bookmarked(),
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            edit_mode: self.edit_mode.active(),
            hint: self.edit_mode.hint().map(str::to_string),
            info_overlay: self.is_info_overlay_visible(),
            rotation: current
                .as_ref()
                .map(|e| self.collection.display_rotation(e).degrees())
                .unwrap_or(0),
            scale_percent: current.as_ref().map(|e| e.scale_percent()).unwrap_or(100),
            message: self.toast.visible_message(),
        }
    }

    /// Call `listener` after any state change a host would redraw for
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        let l = listener.clone();
        self.collection.subscribe(move || l());
        let l = listener.clone();
        self.dialogs.subscribe(move || l());
        let l = listener.clone();
        self.grid.subscribe(move || l());
        let l = listener.clone();
        self.edit_mode.subscribe(move || l());
        let l = listener.clone();
        self.toast.subscribe(move || l());
        self.overlay_observers.subscribe(move || listener());
    }

    // ===== Accessors =====

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn tag_cache(&self) -> &TagCache {
        &self.tags
    }

    pub fn dialogs(&self) -> &Dialogs {
        &self.dialogs
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    pub fn edit_mode(&self) -> &EditMode {
        &self.edit_mode
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    pub fn is_info_overlay_visible(&self) -> bool {
        self.info_overlay.load(Ordering::SeqCst)
    }
}

/// Confirmed delete: drop the entry, then the file. No rollback if the file stays.
async fn delete_confirmed(collection: Collection, sink: Arc<dyn FileSink>, toast: Toast, path: String) {
    if collection.current_path().ok().as_deref() != Some(path.as_str()) {
        tracing::warn!("Current image changed before delete was confirmed: {}", path);
        return;
    }
    if let Err(e) = collection.delete_current() {
        tracing::warn!("Delete aborted: {}", e);
        return;
    }

    match sink.delete(&path).await {
        Ok(()) => {
            tracing::info!("Deleted {}", path);
            toast.show(format!("Deleted {}", name_of(&path)));
        }
        Err(e) => {
            tracing::error!("Failed to delete {}: {}", path, e);
            toast.show(AppError::from(e).user_message());
        }
    }
}
