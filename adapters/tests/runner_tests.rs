//! Benchmark runner and reporting integration tests

use std::sync::Arc;
use std::time::Duration;

use statebench_adapters::{default_registry, MutableAdapter, SnapshotAdapter};
use statebench_harness::dataset::{DatasetSpec, RootState};
use statebench_harness::error::HarnessError;
use statebench_harness::{
    run_and_report, BenchmarkSession, RunnerConfig, ScenarioKind, ScenarioOptions,
};

fn fast_config(runs: usize) -> RunnerConfig {
    RunnerConfig {
        runs,
        warmup_runs: 1,
        inter_run_delay: Duration::from_millis(1),
    }
}

fn small_state() -> Arc<RootState> {
    Arc::new(DatasetSpec::small().generate())
}

#[tokio::test]
async fn run_benchmark_keeps_the_configured_run_count() {
    let mut session = BenchmarkSession::new();
    let result = session
        .run_benchmark(
            Arc::new(MutableAdapter),
            ScenarioKind::BulkUpdate,
            &ScenarioOptions::default(),
            small_state(),
            &fast_config(3),
        )
        .await
        .expect("benchmark runs");

    assert_eq!(result.runs.len(), 3);
    assert_eq!(result.adapter, "manual-mutation");
    assert_eq!(result.scenario, "bulk-update");
    for metrics in &result.runs {
        assert!(metrics.execution_time >= 0.0);
        assert!(metrics.render_count > 0);
        assert!(!metrics.latencies.is_empty());
        assert!(metrics.memory_usage >= 0.0);
        assert!(metrics.fps >= 0.0);
    }

    let average = &result.average;
    assert!(average.latency.p50 <= average.latency.p95);
    assert!(average.latency.p95 <= average.latency.p99);

    assert_eq!(session.results().len(), 1);
    session.clear_results();
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn inline_editing_records_one_latency_per_edit() {
    let mut session = BenchmarkSession::new();
    let result = session
        .run_benchmark(
            Arc::new(SnapshotAdapter),
            ScenarioKind::InlineEditing,
            &ScenarioOptions::default(),
            small_state(),
            &fast_config(2),
        )
        .await
        .expect("benchmark runs");

    assert_eq!(result.runs.len(), 2);
    for metrics in &result.runs {
        assert_eq!(metrics.latencies.len(), 20);
    }
    assert!(result.average.latency.p99 >= result.average.latency.p50);
}

#[tokio::test]
async fn cold_start_measures_the_mount() {
    let mut session = BenchmarkSession::new();
    let result = session
        .run_benchmark(
            Arc::new(MutableAdapter),
            ScenarioKind::ColdStart,
            &ScenarioOptions::default(),
            small_state(),
            &fast_config(2),
        )
        .await
        .expect("benchmark runs");

    // Every probe renders once on mount; no actions are dispatched.
    for metrics in &result.runs {
        assert!(metrics.render_count > 0);
        assert!(metrics.latencies.is_empty());
    }
}

#[tokio::test]
async fn a_failing_workload_leaves_no_partial_result() {
    let spec = DatasetSpec {
        tags: 0,
        ..DatasetSpec::small()
    };
    let mut session = BenchmarkSession::new();
    let err = session
        .run_benchmark(
            Arc::new(MutableAdapter),
            ScenarioKind::BulkUpdate,
            &ScenarioOptions::default(),
            Arc::new(spec.generate()),
            &fast_config(3),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::MissingTarget { .. }));
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn run_and_report_resolves_names_and_wraps_the_result() {
    let registry = default_registry();
    let mut session = BenchmarkSession::new();
    let report = run_and_report(
        &mut session,
        &registry,
        Some("indexed-collections"),
        Some("bulk-update"),
        small_state(),
        &fast_config(2),
    )
    .await
    .expect("report produced");

    assert_eq!(report.result.adapter, "indexed-collections");
    assert_eq!(report.result.scenario, "bulk-update");
    assert_eq!(report.result.runs.len(), 2);
    assert!(report.environment.logical_cores >= 1);
    assert_eq!(report.bundle_size_kb, 0.0);
    assert_eq!(report.layout_time_ms, 0.0);
    assert_eq!(report.gc_pause_count, 0);

    let json = report.to_json().expect("serializes");
    assert!(json.contains("\"executionTime\""));
    assert!(json.contains("\"renderCount\""));
    assert!(json.contains("\"p99\""));
}

#[tokio::test]
async fn run_and_report_rejects_unknown_names() {
    let registry = default_registry();
    let mut session = BenchmarkSession::new();

    let err = run_and_report(
        &mut session,
        &registry,
        Some("mobx"),
        None,
        small_state(),
        &fast_config(1),
    )
    .await
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mobx"));
    assert!(message.contains("manual-mutation"));

    let err = run_and_report(
        &mut session,
        &registry,
        None,
        Some("teleport"),
        small_state(),
        &fast_config(1),
    )
    .await
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("teleport"));
    assert!(message.contains("inline-editing"));
}
