//! Bounded snapshot stack.

use std::collections::VecDeque;

use cardling_core::Snapshot;

/// Stack of snapshots that drops its oldest entry when full
#[derive(Debug, Clone)]
pub struct HistoryStack {
    /// Bottom (oldest) at the front, top at the back
    entries: VecDeque<Snapshot>,
    limit: usize,
}

impl HistoryStack {
    /// Create an empty stack holding at most `limit` entries (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Push on top, returning the evicted bottom entry if the stack was full
    pub fn push(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        let evicted = if self.entries.len() >= self.limit {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(snapshot);
        evicted
    }

    /// Remove and return the top entry
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Iterate bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}
