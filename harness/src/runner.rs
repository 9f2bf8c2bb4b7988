//! Benchmark runner
//!
//! Executes one workload for a fixed run count plus warm-up, samples
//! execution time, render count, memory delta, frame rate, and per-call
//! latencies for every iteration, then aggregates the kept runs under the
//! statistics policy in [`crate::stats`].
//!
//! Iterations are strictly sequential: iteration `k + 1` never starts before
//! iteration `k`'s settling delay has elapsed. A workload failure propagates
//! immediately and discards every sample of the in-progress call, so no
//! partial result is ever appended to the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::adapter::StoreAdapter;
use crate::context::RunContext;
use crate::counter::RenderCounter;
use crate::dataset::RootState;
use crate::error::Result;
use crate::memory::MemoryProbe;
use crate::scenario::{ScenarioKind, ScenarioOptions, WorkloadDriver};
use crate::stats;
use crate::{AverageMetrics, BenchmarkMetrics, BenchmarkResult, LatencySummary};

/// Tick interval of the frame pump (~60 Hz).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Settling pause between iterations.
pub const INTER_RUN_DELAY: Duration = Duration::from_millis(100);

/// Runner configuration. Warm-up is always at least one run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub runs: usize,
    pub warmup_runs: usize,
    pub inter_run_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            runs: 10,
            warmup_runs: 1,
            inter_run_delay: INTER_RUN_DELAY,
        }
    }
}

/// Counts event-loop frame ticks while a workload runs. A starved executor
/// delivers fewer ticks, which shows up as a lower fps estimate; missed
/// ticks are skipped rather than replayed so starvation is not hidden.
struct FramePump {
    ticks: Arc<AtomicU64>,
    token: CancellationToken,
    started: Instant,
    task: tokio::task::JoinHandle<()>,
}

impl FramePump {
    fn start() -> Self {
        let ticks = Arc::new(AtomicU64::new(0));
        let token = CancellationToken::new();
        let tick_counter = ticks.clone();
        let pump_token = token.clone();
        let task = tokio::spawn(async move {
            let mut frames = tokio::time::interval(FRAME_INTERVAL);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and is not a frame.
            frames.tick().await;
            loop {
                tokio::select! {
                    _ = pump_token.cancelled() => break,
                    _ = frames.tick() => {
                        tick_counter.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
        Self {
            ticks,
            token,
            started: Instant::now(),
            task,
        }
    }

    /// Stops the pump and returns the observed frame rate, 0.0 when nothing
    /// useful was measured.
    async fn stop(self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.token.cancel();
        let _ = self.task.await;
        if elapsed <= 0.0 {
            return 0.0;
        }
        let fps = self.ticks.load(Ordering::Relaxed) as f64 / elapsed;
        if fps.is_finite() {
            fps.max(0.0)
        } else {
            0.0
        }
    }
}

/// One benchmarking session: owns the process-wide results list and the
/// run-scoped counters. Sessions are independent; tests create their own
/// instead of sharing ambient state. One benchmark runs at a time per
/// session — adapters are not safe against concurrent mutation streams.
#[derive(Default)]
pub struct BenchmarkSession {
    results: Vec<BenchmarkResult>,
    memory: MemoryProbe,
}

impl BenchmarkSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results of every completed benchmark, in completion order.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Runs `warmup + runs` iterations of the scenario against the adapter
    /// and returns the aggregate over the counted runs.
    pub async fn run_benchmark(
        &mut self,
        adapter: Arc<dyn StoreAdapter>,
        scenario: ScenarioKind,
        options: &ScenarioOptions,
        initial: Arc<RootState>,
        config: &RunnerConfig,
    ) -> Result<BenchmarkResult> {
        let counter = RenderCounter::new();
        let ctx = RunContext::new(adapter.clone(), initial, counter.clone())?;
        let driver = WorkloadDriver::new();

        let warmup = config.warmup_runs.max(1);
        let total = warmup + config.runs;
        let mut samples: Vec<BenchmarkMetrics> = Vec::with_capacity(total);

        for iteration in 0..total {
            counter.reset();
            ctx.latencies().take();

            let memory_before = self.memory.sample_mb();
            let pump = FramePump::start();
            let started = Instant::now();
            let outcome = driver.run(scenario, &ctx, iteration, options).await;
            let elapsed = started.elapsed();
            let fps = pump.stop().await;
            let memory_after = self.memory.sample_mb();

            let run = outcome?;
            let execution = elapsed
                .checked_sub(run.synthetic_delay)
                .unwrap_or(Duration::ZERO);

            samples.push(BenchmarkMetrics {
                execution_time: execution.as_secs_f64() * 1000.0,
                render_count: counter.total(),
                memory_usage: MemoryProbe::delta_mb(memory_before, memory_after),
                fps,
                latencies: ctx.latencies().take(),
                timestamp: Utc::now(),
                adapter: adapter.name().to_string(),
                scenario: scenario.to_string(),
            });

            tokio::time::sleep(config.inter_run_delay).await;
        }

        let kept = samples.split_off(warmup);
        let average = aggregate(&kept);
        let result = BenchmarkResult {
            adapter: adapter.name().to_string(),
            scenario: scenario.to_string(),
            runs: kept,
            average,
        };
        self.results.push(result.clone());
        Ok(result)
    }
}

fn aggregate(kept: &[BenchmarkMetrics]) -> AverageMetrics {
    let execution: Vec<f64> = kept.iter().map(|m| m.execution_time).collect();
    let renders: Vec<f64> = kept.iter().map(|m| m.render_count as f64).collect();
    let memory: Vec<f64> = kept.iter().map(|m| m.memory_usage).collect();
    // Zero fps means the host had no frame source for that run; keep those
    // out of the average instead of dragging it down.
    let fps: Vec<f64> = kept.iter().map(|m| m.fps).filter(|v| *v > 0.0).collect();

    let rejected = execution.len() - stats::reject_outliers(&execution).len();
    if rejected > 0 {
        warn!(rejected, "execution-time outliers excluded from average");
    }

    let latencies: Vec<f64> = kept
        .iter()
        .flat_map(|m| m.latencies.iter().copied())
        .filter(|v| v.is_finite())
        .collect();

    AverageMetrics {
        execution_time: stats::central_tendency(&execution),
        render_count: stats::central_tendency(&renders),
        memory_usage: stats::central_tendency(&memory),
        fps: if fps.is_empty() {
            0.0
        } else {
            stats::central_tendency(&fps)
        },
        latency: LatencySummary {
            p50: stats::percentile(&latencies, 50.0),
            p95: stats::percentile(&latencies, 95.0),
            p99: stats::percentile(&latencies, 99.0),
        },
    }
}
