//! Named render counters
//!
//! A `RenderCounter` tracks how many times each logical UI unit re-executed.
//! Instances are independent; cloning a counter yields another handle onto
//! the same table, which is how a run-scoped counter is threaded through the
//! workload call chain. Callers must pick one counter per logical session —
//! mixing attribution across counters corrupts comparability.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct RenderCounter {
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl RenderCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the named counter, creating it at zero first if absent.
    pub fn increment(&self, name: &str) {
        let mut counts = self.counts.lock().expect("render counter lock poisoned");
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Point-in-time snapshot. The returned map is an owned copy; mutating
    /// it has no effect on the counter.
    pub fn get(&self) -> HashMap<String, u64> {
        self.counts
            .lock()
            .expect("render counter lock poisoned")
            .clone()
    }

    /// Sum over all named counts.
    pub fn total(&self) -> u64 {
        self.counts
            .lock()
            .expect("render counter lock poisoned")
            .values()
            .sum()
    }

    /// Clears all entries.
    pub fn reset(&self) {
        self.counts
            .lock()
            .expect("render counter lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_creates_and_counts() {
        let counter = RenderCounter::new();
        counter.increment("card:card_000");
        counter.increment("card:card_000");
        counter.increment("board");
        let snapshot = counter.get();
        assert_eq!(snapshot.get("card:card_000"), Some(&2));
        assert_eq!(snapshot.get("board"), Some(&1));
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn snapshots_are_isolated_copies() {
        let counter = RenderCounter::new();
        counter.increment("deck:deck_000");
        let a = counter.get();
        let b = counter.get();
        assert_eq!(a, b);

        let mut stolen = counter.get();
        stolen.insert("board".to_string(), 99);
        assert_eq!(counter.get().get("board"), None);
    }

    #[test]
    fn reset_clears_everything() {
        let counter = RenderCounter::new();
        for _ in 0..5 {
            counter.increment("comment:comment_000");
        }
        counter.reset();
        assert!(counter.get().is_empty());
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn clones_share_the_table() {
        let counter = RenderCounter::new();
        let scoped = counter.clone();
        scoped.increment("board");
        assert_eq!(counter.total(), 1);
    }
}
