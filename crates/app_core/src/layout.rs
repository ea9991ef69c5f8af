//! Grid of visible cells

use crate::config::GridConfig;
use crate::observe::{Observers, SubscriptionId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridSize {
    rows: usize,
    cols: usize,
}

/// Rows x columns of cells shown from the cursor onwards.
///
/// Both dimensions stay within `1..=max`. Cloning yields another handle to
/// the same layout.
#[derive(Clone)]
pub struct GridLayout {
    size: Arc<Mutex<GridSize>>,
    max_rows: usize,
    max_cols: usize,
    observers: Observers,
}

impl GridLayout {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            size: Arc::new(Mutex::new(GridSize { rows: 1, cols: 1 })),
            max_rows: config.max_rows.max(1),
            max_cols: config.max_cols.max(1),
            observers: Observers::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.size.lock().rows
    }

    pub fn cols(&self) -> usize {
        self.size.lock().cols
    }

    /// Number of visible cells
    pub fn cells(&self) -> usize {
        let size = self.size.lock();
        size.rows * size.cols
    }

    pub fn rows_increment(&self) {
        let max = self.max_rows;
        self.update(|s| s.rows = (s.rows + 1).min(max));
    }

    pub fn rows_decrement(&self) {
        self.update(|s| s.rows = s.rows.saturating_sub(1).max(1));
    }

    pub fn cols_increment(&self) {
        let max = self.max_cols;
        self.update(|s| s.cols = (s.cols + 1).min(max));
    }

    pub fn cols_decrement(&self) {
        self.update(|s| s.cols = s.cols.saturating_sub(1).max(1));
    }

    fn update(&self, f: impl FnOnce(&mut GridSize)) {
        let (before, after) = {
            let mut size = self.size.lock();
            let before = *size;
            f(&mut size);
            (before, *size)
        };
        if before != after {
            tracing::debug!(rows = after.rows, cols = after.cols, "Grid resized");
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

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(&GridConfig::default())
    }
}

impl std::fmt::Debug for GridLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = *self.size.lock();
        f.debug_struct("GridLayout")
            .field("rows", &size.rows)
            .field("cols", &size.cols)
            .finish()
    }
}
