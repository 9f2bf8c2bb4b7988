//! statebench measurement and orchestration engine
//!
//! This crate benchmarks state-management backends under identical synthetic
//! workloads and produces comparable, statistically cleaned numbers across
//! very different internal update models. It provides:
//!
//! - A capability interface every backend implements (store factory, read
//!   hooks with referential stability, uniform action dispatch)
//! - Deterministic workload scenarios with cooperative cancellation
//! - Per-call action latency recording
//! - Render fan-out instrumentation through named probes
//! - A benchmark runner with warm-up stripping, IQR outlier rejection, and
//!   percentile aggregation
//! - An adapter validation harness used as a pre-flight gate
//!
//! All mutable session state (results list, run-scoped counters) lives in an
//! explicitly owned [`runner::BenchmarkSession`]; nothing is ambient, so
//! independent sessions can coexist in tests.

pub mod adapter;
pub mod config;
pub mod context;
pub mod counter;
pub mod dataset;
pub mod error;
pub mod latency;
pub mod memory;
pub mod probe;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod stats;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use adapter::{ActionRequest, ActionSet, AdapterRegistry, StoreAdapter, StoreHandle};
pub use counter::RenderCounter;
pub use dataset::{DatasetSpec, EntityId, RootState};
pub use error::{HarnessError, Result, StoreError};
pub use report::{run_and_report, StandardizedReport};
pub use runner::{BenchmarkSession, RunnerConfig};
pub use scenario::{ScenarioKind, ScenarioOptions, WorkloadDriver};
pub use validate::{validate_all, AdapterTestResult};

/// One execution's raw sample. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkMetrics {
    /// Wall-clock execution time minus the scenario's own synthetic waits, ms.
    pub execution_time: f64,
    /// Fan-out observed by the run-scoped render counter.
    pub render_count: u64,
    /// Process memory delta over the run, MB; 0 when unavailable.
    pub memory_usage: f64,
    /// Frame-rate estimate; 0 when no frame source was available.
    pub fps: f64,
    /// Per-call action latencies in call order, ms.
    pub latencies: Vec<f64>,
    pub timestamp: DateTime<Utc>,
    pub adapter: String,
    pub scenario: String,
}

/// Latency percentiles over all kept runs' series, concatenated and sorted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Central tendencies over the kept runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageMetrics {
    pub execution_time: f64,
    pub render_count: f64,
    pub memory_usage: f64,
    pub fps: f64,
    pub latency: LatencySummary,
}

/// Aggregate over one scenario x adapter pair. Warm-up runs are excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub adapter: String,
    pub scenario: String,
    pub runs: Vec<BenchmarkMetrics>,
    pub average: AverageMetrics,
}
