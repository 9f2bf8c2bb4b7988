//! Per-benchmark execution context
//!
//! Binds one adapter activation together: the store handle, the
//! latency-wrapped action set, the probe tree, and the run-scoped render
//! counter. The context is created once per `run_benchmark` call and threaded
//! explicitly through the workload — counters are never discovered through
//! ambient state.

use std::sync::Arc;

use crate::adapter::{ActionRequest, ActionSet, StoreAdapter, StoreHandle};
use crate::counter::RenderCounter;
use crate::dataset::RootState;
use crate::error::StoreError;
use crate::latency::{LatencySeries, RecordingActions};
use crate::probe::ProbeSet;

pub struct RunContext {
    adapter: Arc<dyn StoreAdapter>,
    initial: Arc<RootState>,
    handle: Arc<dyn StoreHandle>,
    actions: RecordingActions,
    probes: ProbeSet,
    counter: RenderCounter,
}

impl RunContext {
    /// Activates the adapter: constructs the store, binds actions, wraps
    /// them for latency recording, and primes the probe tree so mount
    /// renders are not attributed to the first mutation.
    pub fn new(
        adapter: Arc<dyn StoreAdapter>,
        initial: Arc<RootState>,
        counter: RenderCounter,
    ) -> Result<Self, StoreError> {
        let handle = adapter.create_store((*initial).clone())?;
        let actions = RecordingActions::wrap(ActionSet::bind(handle.clone()), LatencySeries::new());
        let probes = ProbeSet::for_state(&initial);
        probes.prime(handle.as_ref());
        Ok(Self {
            adapter,
            initial,
            handle,
            actions,
            probes,
            counter,
        })
    }

    /// Dispatches through the latency wrapper, then runs the simulated
    /// render pass. A failed action triggers no render.
    pub fn dispatch(&self, action: &ActionRequest) -> Result<(), StoreError> {
        let result = self.actions.dispatch(action);
        if result.is_ok() {
            self.probes.sample(self.handle.as_ref(), &self.counter);
        }
        result
    }

    pub fn adapter(&self) -> &Arc<dyn StoreAdapter> {
        &self.adapter
    }

    pub fn initial(&self) -> &Arc<RootState> {
        &self.initial
    }

    pub fn handle(&self) -> &Arc<dyn StoreHandle> {
        &self.handle
    }

    pub fn counter(&self) -> &RenderCounter {
        &self.counter
    }

    pub fn latencies(&self) -> &LatencySeries {
        self.actions.series()
    }
}
