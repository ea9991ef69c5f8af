//! Transient status message

use crate::observe::{Observers, SubscriptionId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(1000);

#[derive(Default)]
struct ToastState {
    visible: bool,
    message: String,
    /// Bumped by every `show`; a dismissal timer only hides its own message
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Single status message that hides itself after a fixed duration.
///
/// Cloning yields another handle to the same toast.
#[derive(Clone)]
pub struct Toast {
    state: Arc<Mutex<ToastState>>,
    duration: Duration,
    observers: Observers,
}

impl Toast {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ToastState::default())),
            duration,
            observers: Observers::new(),
        }
    }

    /// Show `message`, replacing the current one and restarting the timer.
    ///
    /// The dismissal timer runs on the ambient tokio runtime. Without one the
    /// message stays until [`dismiss`](Self::dismiss) is called.
    pub fn show(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(toast = %message);

        {
            let mut state = self.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.visible = true;
            state.message = message;
            state.generation += 1;

            let generation = state.generation;
            state.timer = match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let toast = self.clone();
                    let duration = self.duration;
                    Some(runtime.spawn(async move {
                        tokio::time::sleep(duration).await;
                        toast.expire(generation);
                    }))
                }
                Err(_) => {
                    tracing::debug!("No runtime, toast will not auto-dismiss");
                    None
                }
            };
        }

        self.observers.notify();
    }

    /// Hide the message immediately
    pub fn dismiss(&self) {
        {
            let mut state = self.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.visible = false;
        }
        self.observers.notify();
    }

    fn expire(&self, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.visible = false;
            state.timer = None;
        }
        self.observers.notify();
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Last message shown (kept after the toast hides)
    pub fn message(&self) -> String {
        self.state.lock().message.clone()
    }

    /// Message currently on screen, if any
    pub fn visible_message(&self) -> Option<String> {
        let state = self.state.lock();
        state.visible.then(|| state.message.clone())
    }

    pub fn duration(&self) -> Duration {
        self.duration
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

impl Default for Toast {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl std::fmt::Debug for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Toast")
            .field("visible", &state.visible)
            .field("message", &state.message)
            .finish()
    }
}
