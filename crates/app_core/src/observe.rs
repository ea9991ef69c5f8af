//! Coarse change notification
//!
//! Stateful components notify their listeners after a mutating call has
//! finished and released its lock. Listeners learn *that* something changed,
//! not *what*; they re-read whatever they render.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Observers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shared list of change listeners
#[derive(Clone, Default)]
pub struct Observers {
    listeners: Arc<Mutex<Vec<(SubscriptionId, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Invoke every listener. Listeners may subscribe or unsubscribe re-entrantly.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
