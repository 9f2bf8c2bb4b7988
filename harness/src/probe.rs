//! Render fan-out instrumentation
//!
//! Stand-ins for the component tree: each probe is a named selector over the
//! hook surface. After a mutation the probe set is sampled; a probe whose
//! selected references lost pointer identity counts one render for its name.
//! Fingerprints hold the `Arc`s they compare, so a freed allocation can never
//! alias a stale pointer.

use std::sync::{Arc, Mutex};

use crate::adapter::StoreHandle;
use crate::counter::RenderCounter;
use crate::dataset::{Card, Comment, Deck, EntityId, RootState, User};

/// One reference a simulated component read from the hook surface.
pub enum ViewRef {
    Deck(Arc<Deck>),
    Card(Arc<Card>),
    Comment(Arc<Comment>),
    User(Arc<User>),
    Ids(Arc<[EntityId]>),
    Missing,
}

impl ViewRef {
    fn same(&self, other: &ViewRef) -> bool {
        match (self, other) {
            (ViewRef::Deck(a), ViewRef::Deck(b)) => Arc::ptr_eq(a, b),
            (ViewRef::Card(a), ViewRef::Card(b)) => Arc::ptr_eq(a, b),
            (ViewRef::Comment(a), ViewRef::Comment(b)) => Arc::ptr_eq(a, b),
            (ViewRef::User(a), ViewRef::User(b)) => Arc::ptr_eq(a, b),
            (ViewRef::Ids(a), ViewRef::Ids(b)) => Arc::ptr_eq(a, b),
            (ViewRef::Missing, ViewRef::Missing) => true,
            _ => false,
        }
    }
}

type Selector = Box<dyn Fn(&dyn StoreHandle) -> Vec<ViewRef> + Send + Sync>;

struct RenderProbe {
    name: String,
    select: Selector,
    last: Mutex<Option<Vec<ViewRef>>>,
}

impl RenderProbe {
    fn observe(&self, handle: &dyn StoreHandle) -> bool {
        let current = (self.select)(handle);
        let mut last = self.last.lock().expect("probe lock poisoned");
        let rerendered = match last.as_ref() {
            Some(previous) => {
                previous.len() != current.len()
                    || previous.iter().zip(&current).any(|(a, b)| !a.same(b))
            }
            // First observation is the mount render.
            None => true,
        };
        *last = Some(current);
        rerendered
    }
}

/// The probe collection for one board shape. Built from the initial state's
/// ids; evaluated against whichever handle is passed to `sample`.
pub struct ProbeSet {
    probes: Vec<RenderProbe>,
}

impl ProbeSet {
    /// Probes for the standard board tree: the board itself, one probe per
    /// deck, card, and comment.
    pub fn for_state(state: &RootState) -> Self {
        let mut probes = Vec::new();

        probes.push(RenderProbe {
            name: "board".to_string(),
            select: Box::new(|h| vec![ViewRef::Ids(h.decks_order())]),
            last: Mutex::new(None),
        });

        for deck_id in &state.decks_order {
            let id = deck_id.clone();
            probes.push(RenderProbe {
                name: format!("deck:{id}"),
                select: Box::new(move |h| {
                    vec![
                        h.deck(&id).map_or(ViewRef::Missing, ViewRef::Deck),
                        ViewRef::Ids(h.card_ids(&id)),
                    ]
                }),
                last: Mutex::new(None),
            });
        }

        for card_id in state.sorted_card_ids() {
            let id = card_id.clone();
            probes.push(RenderProbe {
                name: format!("card:{card_id}"),
                select: Box::new(move |h| {
                    let assignees = h.assignee_ids(&id);
                    let mut refs = vec![
                        h.card(&id).map_or(ViewRef::Missing, ViewRef::Card),
                        ViewRef::Ids(h.tag_ids(&id)),
                        ViewRef::Ids(h.comment_ids(&id)),
                        ViewRef::Ids(assignees.clone()),
                    ];
                    // A card shows its assignees' names, so it re-renders
                    // when one of those users changes.
                    for user_id in assignees.iter() {
                        refs.push(h.user(user_id).map_or(ViewRef::Missing, ViewRef::User));
                    }
                    refs
                }),
                last: Mutex::new(None),
            });
        }

        for comment_id in state.sorted_comment_ids() {
            let id = comment_id.clone();
            probes.push(RenderProbe {
                name: format!("comment:{comment_id}"),
                select: Box::new(move |h| {
                    vec![h.comment(&id).map_or(ViewRef::Missing, ViewRef::Comment)]
                }),
                last: Mutex::new(None),
            });
        }

        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Re-evaluates every probe, incrementing the counter for each one that
    /// re-rendered. Returns how many did.
    pub fn sample(&self, handle: &dyn StoreHandle, counter: &RenderCounter) -> usize {
        let mut rerendered = 0;
        for probe in &self.probes {
            if probe.observe(handle) {
                counter.increment(&probe.name);
                rerendered += 1;
            }
        }
        rerendered
    }

    /// Records current references without counting anything, so the next
    /// `sample` reflects mutations rather than the mount.
    pub fn prime(&self, handle: &dyn StoreHandle) {
        for probe in &self.probes {
            probe.observe(handle);
        }
    }
}
