//! Synthetic workload scenarios
//!
//! A fixed catalogue of deterministic action sequences, each parameterizable
//! through `ScenarioOptions` with documented defaults. Scenarios run
//! cooperatively: cancellation is checked between steps, never mid-step, and
//! any ticker a scenario armed dies with its run. Every execution reports its
//! own synthetic-delay contribution (the deliberate pacing pauses) so the
//! runner can subtract scaffolding time without a name-keyed delay table.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapter::ActionRequest;
use crate::context::RunContext;
use crate::dataset::EntityId;
use crate::error::{HarnessError, Result};
use crate::probe::ProbeSet;

/// Keystroke interval for inline editing.
pub const KEYSTROKE_INTERVAL: Duration = Duration::from_millis(16);
/// Number of sequential edits in one inline-editing pass.
pub const INLINE_EDITS: usize = 20;
/// How long background churn keeps ticking by default.
pub const CHURN_DURATION: Duration = Duration::from_millis(1000);
/// Interval between churn ticks.
pub const CHURN_INTERVAL: Duration = Duration::from_millis(1000);
/// Cards touched per churn tick.
pub const CHURN_WINDOW: usize = 10;
/// Rounds of tag toggling in one bulk-update pass.
pub const BULK_ROUNDS: usize = 5;
/// Cards in the bulk-update pool.
pub const BULK_POOL: usize = 10;
/// Renames issued per fan-out pass.
pub const FAN_OUT_REPEAT: usize = 5;
/// Visibility windows stepped through per scroll pass.
pub const SCROLL_STEPS: usize = 8;
/// Cards visible at once while scrolling.
pub const SCROLL_WINDOW: usize = 10;

/// The fixed scenario catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    BackgroundChurn,
    InlineEditing,
    BulkUpdate,
    FanOutUpdate,
    Scroll,
    ColdStart,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 6] = [
        ScenarioKind::BackgroundChurn,
        ScenarioKind::InlineEditing,
        ScenarioKind::BulkUpdate,
        ScenarioKind::FanOutUpdate,
        ScenarioKind::Scroll,
        ScenarioKind::ColdStart,
    ];

    pub fn catalogue() -> String {
        Self::ALL
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::BackgroundChurn => "background-churn",
            ScenarioKind::InlineEditing => "inline-editing",
            ScenarioKind::BulkUpdate => "bulk-update",
            ScenarioKind::FanOutUpdate => "fan-out-update",
            ScenarioKind::Scroll => "scroll",
            ScenarioKind::ColdStart => "cold-start",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ScenarioKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "background-churn" => Ok(ScenarioKind::BackgroundChurn),
            "inline-editing" => Ok(ScenarioKind::InlineEditing),
            "bulk-update" => Ok(ScenarioKind::BulkUpdate),
            "fan-out-update" => Ok(ScenarioKind::FanOutUpdate),
            "scroll" => Ok(ScenarioKind::Scroll),
            "cold-start" => Ok(ScenarioKind::ColdStart),
            other => Err(HarnessError::UnknownScenario {
                name: other.to_string(),
                available: ScenarioKind::catalogue(),
            }),
        }
    }
}

/// Per-scenario knobs. Missing fields fall back to the fixed defaults above;
/// fields a scenario does not use are ignored.
///
/// Per scenario: `target` overrides the deterministic target entity
/// (inline-editing, fan-out-update); `duration_ms`/`interval_ms` pace
/// background churn; `window` bounds the churn/scroll window and the
/// bulk-update pool; `rounds` the bulk-update rounds; `repeat` the edit,
/// rename, or scroll-step count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioOptions {
    pub target: Option<EntityId>,
    pub duration_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub window: Option<usize>,
    pub rounds: Option<usize>,
    pub repeat: Option<usize>,
}

/// What one scenario execution did, including the pacing time the runner
/// must subtract from the measured wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioRun {
    pub steps: u32,
    pub synthetic_delay: Duration,
}

/// Translates scenario names into action sequences against the bound
/// actions of the active context. One driver serves one benchmark session;
/// starting a new run cancels whatever the previous run still had armed.
#[derive(Default)]
pub struct WorkloadDriver {
    active: Mutex<CancellationToken>,
}

impl WorkloadDriver {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(CancellationToken::new()),
        }
    }

    /// Cooperative stop: takes effect between steps of the running scenario.
    pub fn stop(&self) {
        self.active
            .lock()
            .expect("driver token lock poisoned")
            .cancel();
    }

    /// Runs one scenario to completion or cancellation. Safe to call again
    /// after a prior `stop()`; a previous invocation's timer stream is
    /// cancelled before the new one starts.
    pub async fn run(
        &self,
        kind: ScenarioKind,
        ctx: &RunContext,
        run_num: usize,
        options: &ScenarioOptions,
    ) -> Result<ScenarioRun> {
        let token = {
            let mut guard = self.active.lock().expect("driver token lock poisoned");
            guard.cancel();
            let fresh = CancellationToken::new();
            *guard = fresh.clone();
            fresh
        };
        debug!(scenario = %kind, run_num, "starting scenario");
        match kind {
            ScenarioKind::BackgroundChurn => background_churn(ctx, run_num, options, &token).await,
            ScenarioKind::InlineEditing => inline_editing(ctx, run_num, options, &token).await,
            ScenarioKind::BulkUpdate => bulk_update(ctx, run_num, options, &token).await,
            ScenarioKind::FanOutUpdate => fan_out_update(ctx, run_num, options, &token).await,
            ScenarioKind::Scroll => scroll(ctx, run_num, options, &token).await,
            ScenarioKind::ColdStart => cold_start(ctx).await,
        }
    }
}

/// Sustained write pressure: a bulk busy-flag mutation over a rotating card
/// window on every tick, then an explicit stop mutation at the end.
async fn background_churn(
    ctx: &RunContext,
    _run_num: usize,
    options: &ScenarioOptions,
    token: &CancellationToken,
) -> Result<ScenarioRun> {
    let cards = ctx.initial().sorted_card_ids();
    if cards.is_empty() {
        return Err(HarnessError::MissingTarget {
            scenario: ScenarioKind::BackgroundChurn.to_string(),
            required: "at least one card",
        });
    }
    let duration = options
        .duration_ms
        .map(Duration::from_millis)
        .unwrap_or(CHURN_DURATION);
    // tokio::time::interval rejects a zero period.
    let interval = options
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(CHURN_INTERVAL)
        .max(Duration::from_millis(1));
    let window = options.window.unwrap_or(CHURN_WINDOW).min(cards.len());

    let started = Instant::now();
    let mut synthetic = Duration::ZERO;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u32 = 0;

    loop {
        if token.is_cancelled() || started.elapsed() >= duration {
            break;
        }
        let wait = Instant::now();
        tokio::select! {
            _ = token.cancelled() => {
                synthetic += wait.elapsed();
                break;
            }
            _ = ticker.tick() => {
                synthetic += wait.elapsed();
            }
        }
        let offset = (ticks as usize * window) % cards.len();
        let slice: Vec<EntityId> = (0..window)
            .map(|i| cards[(offset + i) % cards.len()].clone())
            .collect();
        ctx.dispatch(&ActionRequest::BeginChurn { card_ids: slice })?;
        ticks += 1;
    }

    ctx.dispatch(&ActionRequest::EndChurn)?;
    Ok(ScenarioRun {
        steps: ticks + 1,
        synthetic_delay: synthetic,
    })
}

/// High-frequency single-entity writes: sequential text edits against one
/// comment, each payload strictly longer than the last, paced at keystroke
/// interval.
async fn inline_editing(
    ctx: &RunContext,
    run_num: usize,
    options: &ScenarioOptions,
    token: &CancellationToken,
) -> Result<ScenarioRun> {
    let target = match &options.target {
        Some(id) => id.clone(),
        None => ctx
            .initial()
            .sorted_comment_ids()
            .first()
            .cloned()
            .ok_or(HarnessError::MissingTarget {
                scenario: ScenarioKind::InlineEditing.to_string(),
                required: "at least one comment",
            })?,
    };
    let edits = options.repeat.unwrap_or(INLINE_EDITS);

    let mut text = format!("edit pass {run_num}:");
    let mut synthetic = Duration::ZERO;
    let mut steps: u32 = 0;
    for i in 0..edits {
        if token.is_cancelled() {
            break;
        }
        text.push((b'a' + (i % 26) as u8) as char);
        ctx.dispatch(&ActionRequest::UpdateCommentText {
            comment_id: target.clone(),
            text: text.clone(),
        })?;
        steps += 1;
        let wait = Instant::now();
        tokio::time::sleep(KEYSTROKE_INTERVAL).await;
        synthetic += wait.elapsed();
    }

    Ok(ScenarioRun {
        steps,
        synthetic_delay: synthetic,
    })
}

/// Batch multi-entity writes: tag toggles over rotating subsets of a fixed
/// card pool. The touched subset depends only on (index, round, run_num), so
/// equal run numbers touch identical subsets.
async fn bulk_update(
    ctx: &RunContext,
    run_num: usize,
    options: &ScenarioOptions,
    token: &CancellationToken,
) -> Result<ScenarioRun> {
    let cards = ctx.initial().sorted_card_ids();
    let tags = ctx.initial().sorted_tag_ids();
    if cards.is_empty() {
        return Err(HarnessError::MissingTarget {
            scenario: ScenarioKind::BulkUpdate.to_string(),
            required: "at least one card",
        });
    }
    if tags.is_empty() {
        return Err(HarnessError::MissingTarget {
            scenario: ScenarioKind::BulkUpdate.to_string(),
            required: "at least one tag",
        });
    }
    let pool: Vec<EntityId> = cards
        .into_iter()
        .take(options.window.unwrap_or(BULK_POOL))
        .collect();
    let rounds = options.rounds.unwrap_or(BULK_ROUNDS).max(1);

    let mut steps: u32 = 0;
    for round in 0..rounds {
        if token.is_cancelled() {
            break;
        }
        for (i, card_id) in pool.iter().enumerate() {
            if i % rounds != round {
                continue;
            }
            let tag_id = &tags[(i * 2 + run_num * 3) % tags.len()];
            ctx.dispatch(&ActionRequest::ToggleCardTag {
                card_id: card_id.clone(),
                tag_id: tag_id.clone(),
            })?;
            steps += 1;
        }
        // Yield between rounds so cancellation has a well-defined boundary.
        tokio::task::yield_now().await;
    }

    Ok(ScenarioRun {
        steps,
        synthetic_delay: Duration::ZERO,
    })
}

/// Rename fan-out: repeated renames of one heavily-assigned user; every card
/// showing that assignee re-renders.
async fn fan_out_update(
    ctx: &RunContext,
    run_num: usize,
    options: &ScenarioOptions,
    token: &CancellationToken,
) -> Result<ScenarioRun> {
    let target = match &options.target {
        Some(id) => id.clone(),
        None => ctx
            .initial()
            .first_user_id()
            .ok_or(HarnessError::MissingTarget {
                scenario: ScenarioKind::FanOutUpdate.to_string(),
                required: "at least one user",
            })?,
    };
    let repeat = options.repeat.unwrap_or(FAN_OUT_REPEAT);

    let mut steps: u32 = 0;
    for k in 0..repeat {
        if token.is_cancelled() {
            break;
        }
        ctx.dispatch(&ActionRequest::RenameUser {
            user_id: target.clone(),
            name: format!("User {run_num}-{k}"),
        })?;
        steps += 1;
        tokio::task::yield_now().await;
    }

    Ok(ScenarioRun {
        steps,
        synthetic_delay: Duration::ZERO,
    })
}

/// Scroll-triggered visibility changes: the visible window slides over the
/// card list one step per frame interval.
async fn scroll(
    ctx: &RunContext,
    _run_num: usize,
    options: &ScenarioOptions,
    token: &CancellationToken,
) -> Result<ScenarioRun> {
    let cards = ctx.initial().sorted_card_ids();
    if cards.is_empty() {
        return Err(HarnessError::MissingTarget {
            scenario: ScenarioKind::Scroll.to_string(),
            required: "at least one card",
        });
    }
    let steps_wanted = options.repeat.unwrap_or(SCROLL_STEPS);
    let window = options.window.unwrap_or(SCROLL_WINDOW).min(cards.len());

    let mut synthetic = Duration::ZERO;
    let mut steps: u32 = 0;
    for s in 0..steps_wanted {
        if token.is_cancelled() {
            break;
        }
        let offset = (s * window) % cards.len();
        let slice: Vec<EntityId> = (0..window)
            .map(|i| cards[(offset + i) % cards.len()].clone())
            .collect();
        ctx.dispatch(&ActionRequest::SetVisibleCards { card_ids: slice })?;
        steps += 1;
        let wait = Instant::now();
        tokio::time::sleep(KEYSTROKE_INTERVAL).await;
        synthetic += wait.elapsed();
    }

    Ok(ScenarioRun {
        steps,
        synthetic_delay: synthetic,
    })
}

/// Mount-time-to-interactive: constructs a fresh store, renders the whole
/// probe tree once, then performs the first full read pass a just-mounted
/// board would issue.
async fn cold_start(ctx: &RunContext) -> Result<ScenarioRun> {
    let fresh = ctx
        .adapter()
        .create_store((**ctx.initial()).clone())
        .map_err(HarnessError::Store)?;

    let probes = ProbeSet::for_state(ctx.initial());
    let mounted = probes.sample(fresh.as_ref(), ctx.counter());

    for deck_id in fresh.decks_order().iter() {
        let _ = fresh.deck(deck_id);
        for card_id in fresh.card_ids(deck_id).iter() {
            let _ = fresh.card(card_id);
            for comment_id in fresh.comment_ids(card_id).iter() {
                let _ = fresh.comment(comment_id);
            }
        }
    }

    Ok(ScenarioRun {
        steps: mounted as u32,
        synthetic_delay: Duration::ZERO,
    })
}
