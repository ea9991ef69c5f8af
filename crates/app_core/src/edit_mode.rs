//! Edit mode flag

use crate::observe::{Observers, SubscriptionId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Help line shown by hosts while edit mode is active
pub const EDIT_MODE_HINT: &str =
    "Edit mode: wheel to zoom, drag to move, Ctrl+R to reset, Esc to exit";

/// Selects which keymap the input router consults.
///
/// Cloning yields another handle to the same flag.
#[derive(Clone, Default)]
pub struct EditMode {
    active: Arc<AtomicBool>,
    observers: Observers,
}

impl EditMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) {
        self.set(true);
    }

    pub fn exit(&self) {
        self.set(false);
    }

    pub fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Hint to display, `None` outside edit mode
    pub fn hint(&self) -> Option<&'static str> {
        self.active().then_some(EDIT_MODE_HINT)
    }

    fn set(&self, active: bool) {
        let was = self.active.swap(active, Ordering::SeqCst);
        if was != active {
            tracing::info!(active, "Edit mode changed");
        }
        self.observers.notify();
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

impl std::fmt::Debug for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditMode")
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_enter_exit() {
        let mode = EditMode::new();
        assert!(!mode.active());
        assert_eq!(mode.hint(), None);

        mode.enter();
        assert!(mode.active());
        assert_eq!(mode.hint(), Some(EDIT_MODE_HINT));

        mode.exit();
        assert!(!mode.active());
    }

    #[test]
    fn test_handles_share_state() {
        let mode = EditMode::new();
        let other = mode.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = hits.clone();
            mode.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        other.enter();
        assert!(mode.active());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
