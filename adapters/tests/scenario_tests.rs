//! Workload driver integration tests

use std::sync::Arc;
use std::time::Duration;

use statebench_adapters::{IndexedAdapter, MutableAdapter, SnapshotAdapter};
use statebench_harness::adapter::{ActionRequest, StoreAdapter, StoreHandle};
use statebench_harness::context::RunContext;
use statebench_harness::counter::RenderCounter;
use statebench_harness::dataset::{DatasetSpec, RootState};
use statebench_harness::error::HarnessError;
use statebench_harness::scenario::{ScenarioKind, ScenarioOptions, WorkloadDriver};

fn context(adapter: Arc<dyn StoreAdapter>, state: &Arc<RootState>) -> Arc<RunContext> {
    Arc::new(
        RunContext::new(adapter, state.clone(), RenderCounter::new()).expect("store constructs"),
    )
}

fn small_state() -> Arc<RootState> {
    Arc::new(DatasetSpec::small().generate())
}

#[tokio::test]
async fn inline_editing_issues_twenty_increasing_edits() {
    let state = small_state();
    let ctx = context(Arc::new(MutableAdapter), &state);
    let driver = WorkloadDriver::new();

    let run = driver
        .run(ScenarioKind::InlineEditing, &ctx, 0, &ScenarioOptions::default())
        .await
        .expect("scenario runs");

    assert_eq!(run.steps, 20);
    assert_eq!(ctx.latencies().snapshot().len(), 20);
    assert!(run.synthetic_delay >= Duration::from_millis(16 * 20));

    let target = state.sorted_comment_ids()[0].clone();
    let comment = ctx.handle().comment(&target).expect("comment exists");
    assert_eq!(comment.text, "edit pass 0:abcdefghijklmnopqrst");
}

#[tokio::test]
async fn background_churn_tick_bounds_and_stop() {
    let state = small_state();
    let ctx = context(Arc::new(MutableAdapter), &state);
    let driver = WorkloadDriver::new();

    // Bounded run: duration equals the default interval, so the immediate
    // tick plus at most one timed tick can fire.
    let options = ScenarioOptions {
        duration_ms: Some(1000),
        ..Default::default()
    };
    let run = driver
        .run(ScenarioKind::BackgroundChurn, &ctx, 0, &options)
        .await
        .expect("scenario runs");
    let ticks = run.steps - 1;
    assert!((1..=2).contains(&ticks), "expected 1..=2 ticks, got {ticks}");

    // Cancelled run: stop() must silence the timer for good.
    ctx.latencies().take();
    let long_options = ScenarioOptions {
        duration_ms: Some(60_000),
        ..Default::default()
    };
    let driver = Arc::new(WorkloadDriver::new());
    let task_ctx = ctx.clone();
    let task_driver = driver.clone();
    let task = tokio::spawn(async move {
        task_driver
            .run(ScenarioKind::BackgroundChurn, &task_ctx, 0, &long_options)
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    driver.stop();
    let run = task.await.expect("join").expect("scenario runs");
    assert!(run.steps >= 1);

    let settled = ctx.latencies().snapshot().len();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(ctx.latencies().snapshot().len(), settled);
}

#[tokio::test]
async fn driver_can_run_again_after_stop() {
    let state = small_state();
    let ctx = context(Arc::new(MutableAdapter), &state);
    let driver = WorkloadDriver::new();

    driver.stop();
    let run = driver
        .run(ScenarioKind::BulkUpdate, &ctx, 0, &ScenarioOptions::default())
        .await
        .expect("scenario runs after a prior stop");
    assert!(run.steps > 0);
}

#[tokio::test]
async fn bulk_update_touches_identical_subsets_for_equal_run_numbers() {
    let state = small_state();
    let options = ScenarioOptions::default();
    let pool: Vec<String> = state.sorted_card_ids().into_iter().take(10).collect();

    let mut memberships = Vec::new();
    for _ in 0..2 {
        let ctx = context(Arc::new(MutableAdapter), &state);
        let driver = WorkloadDriver::new();
        driver
            .run(ScenarioKind::BulkUpdate, &ctx, 3, &options)
            .await
            .expect("scenario runs");
        let snapshot: Vec<Vec<String>> = pool
            .iter()
            .map(|card| ctx.handle().tag_ids(card).to_vec())
            .collect();
        memberships.push(snapshot);
    }
    assert_eq!(memberships[0], memberships[1]);
}

#[tokio::test]
async fn missing_scenario_target_is_a_descriptive_error() {
    let spec = DatasetSpec {
        comments_per_card: 0,
        ..DatasetSpec::small()
    };
    let state = Arc::new(spec.generate());
    let ctx = context(Arc::new(MutableAdapter), &state);
    let driver = WorkloadDriver::new();

    let err = driver
        .run(ScenarioKind::InlineEditing, &ctx, 0, &ScenarioOptions::default())
        .await
        .unwrap_err();
    match err {
        HarnessError::MissingTarget { scenario, .. } => {
            assert_eq!(scenario, "inline-editing");
        }
        other => panic!("expected MissingTarget, got {other}"),
    }
}

#[tokio::test]
async fn fan_out_orders_the_update_models() {
    let state = small_state();
    let edit = ActionRequest::UpdateCommentText {
        comment_id: state.sorted_comment_ids()[0].clone(),
        text: "fan-out probe".into(),
    };

    let mut totals = Vec::new();
    let adapters: [Arc<dyn StoreAdapter>; 3] = [
        Arc::new(IndexedAdapter),
        Arc::new(MutableAdapter),
        Arc::new(SnapshotAdapter),
    ];
    for adapter in adapters {
        let ctx = context(adapter, &state);
        ctx.dispatch(&edit).expect("edit applies");
        totals.push(ctx.counter().total());
    }

    let (indexed, mutable, snapshot) = (totals[0], totals[1], totals[2]);
    assert_eq!(indexed, 1, "fine-grained store re-renders only the comment");
    assert!(
        indexed < mutable && mutable < snapshot,
        "expected indexed < mutable < snapshot, got {indexed} / {mutable} / {snapshot}"
    );
}
