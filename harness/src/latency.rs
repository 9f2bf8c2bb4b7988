//! Per-call action latency recording
//!
//! `RecordingActions` wraps a bound `ActionSet` so that every dispatch is
//! bracketed by wall-clock timestamps. The inner result is returned
//! unchanged; on failure the latency up to the failure point is still
//! recorded. The only per-call allocation is the series push.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::adapter::{ActionRequest, ActionSet};
use crate::error::StoreError;

/// The latency sink for one benchmark iteration, in milliseconds. Clones
/// share the underlying series.
#[derive(Debug, Clone, Default)]
pub struct LatencySeries {
    samples: Arc<Mutex<Vec<f64>>>,
}

impl LatencySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, ms: f64) {
        self.samples.lock().expect("latency lock poisoned").push(ms);
    }

    pub fn len(&self) -> usize {
        self.samples.lock().expect("latency lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the recorded samples, leaving the series empty for the next
    /// iteration.
    pub fn take(&self) -> Vec<f64> {
        std::mem::take(&mut *self.samples.lock().expect("latency lock poisoned"))
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.lock().expect("latency lock poisoned").clone()
    }
}

/// An `ActionSet` whose every call is timed.
#[derive(Clone)]
pub struct RecordingActions {
    inner: ActionSet,
    series: LatencySeries,
}

impl RecordingActions {
    pub fn wrap(inner: ActionSet, series: LatencySeries) -> Self {
        Self { inner, series }
    }

    pub fn series(&self) -> &LatencySeries {
        &self.series
    }

    pub fn dispatch(&self, action: &ActionRequest) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.dispatch(action);
        self.series
            .record(start.elapsed().as_nanos() as f64 / 1_000_000.0);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_the_series() {
        let series = LatencySeries::new();
        series.record(1.5);
        series.record(2.5);
        assert_eq!(series.len(), 2);
        let taken = series.take();
        assert_eq!(taken, vec![1.5, 2.5]);
        assert!(series.is_empty());
    }

    #[test]
    fn clones_share_the_sink() {
        let series = LatencySeries::new();
        let shared = series.clone();
        shared.record(3.0);
        assert_eq!(series.snapshot(), vec![3.0]);
    }
}
