//! Back/forward log of cursor jumps

use std::collections::VecDeque;

/// Default number of remembered transitions
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// One jump from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transition {
    from: String,
    to: String,
}

/// Bounded log of (from, to) path transitions with a movable position.
///
/// `current == len` means "at the tip" and `current == 0` means "before the
/// first transition".
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Transition>,
    current: usize,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            current: 0,
            capacity,
        }
    }

    /// Record a transition, discarding everything after the current position
    pub fn add(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.entries.truncate(self.current);
        self.entries.push_back(Transition {
            from: from.into(),
            to: to.into(),
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.current = self.entries.len();
    }

    /// Step back and return the origin of the transition stepped over
    pub fn prev_path(&mut self) -> Option<String> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(self.entries[self.current].from.clone())
    }

    /// Step forward and return the destination of the transition stepped over
    pub fn next_path(&mut self) -> Option<String> {
        let transition = self.entries.get(self.current)?;
        let to = transition.to.clone();
        self.current += 1;
        Some(to)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
