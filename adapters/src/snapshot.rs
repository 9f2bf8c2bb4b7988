//! Immutable-snapshot backend
//!
//! The canonical copy-on-write model: the authoritative state is plain data,
//! and every mutation rebuilds a complete view with fresh `Arc`s for every
//! entity and every collection. Reads between mutations are maximally stable
//! and maximally cheap; writes invalidate the identity of everything.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use statebench_harness::adapter::{ActionRequest, StoreAdapter, StoreHandle};
use statebench_harness::dataset::{
    Card, CardTag, Comment, Deck, EntityId, RootState, Tag, User,
};
use statebench_harness::error::{EntityKind, StoreError};

pub struct SnapshotAdapter;

impl StoreAdapter for SnapshotAdapter {
    fn name(&self) -> &str {
        "immutable-snapshot"
    }

    fn create_store(&self, initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError> {
        Ok(Arc::new(SnapshotStore::new(initial)))
    }
}

/// One fully materialized view of the board.
struct Snapshot {
    decks: HashMap<EntityId, Arc<Deck>>,
    cards: HashMap<EntityId, Arc<Card>>,
    comments: HashMap<EntityId, Arc<Comment>>,
    users: HashMap<EntityId, Arc<User>>,
    tags: HashMap<EntityId, Arc<Tag>>,
    decks_order: Arc<[EntityId]>,
    card_ids: HashMap<EntityId, Arc<[EntityId]>>,
    comment_ids: HashMap<EntityId, Arc<[EntityId]>>,
    tag_ids: HashMap<EntityId, Arc<[EntityId]>>,
    assignee_ids: HashMap<EntityId, Arc<[EntityId]>>,
    empty: Arc<[EntityId]>,
}

impl Snapshot {
    fn build(state: &RootState) -> Self {
        let mut card_ids = HashMap::new();
        let mut comment_ids = HashMap::new();
        let mut tag_ids = HashMap::new();
        let mut assignee_ids = HashMap::new();

        for deck_id in state.entities.decks.keys() {
            card_ids.insert(deck_id.clone(), state.cards_in(deck_id).into());
        }
        for card_id in state.entities.cards.keys() {
            comment_ids.insert(card_id.clone(), state.comments_in(card_id).into());
            tag_ids.insert(card_id.clone(), state.tags_of(card_id).into());
            let mut assignees: Vec<EntityId> = state
                .entities
                .card_assignments
                .values()
                .filter(|ca| &ca.card_id == card_id)
                .map(|ca| ca.user_id.clone())
                .collect();
            assignees.sort();
            assignee_ids.insert(card_id.clone(), assignees.into());
        }

        Self {
            decks: clone_table(&state.entities.decks),
            cards: clone_table(&state.entities.cards),
            comments: clone_table(&state.entities.comments),
            users: clone_table(&state.entities.users),
            tags: clone_table(&state.entities.tags),
            decks_order: state.decks_order.clone().into(),
            card_ids,
            comment_ids,
            tag_ids,
            assignee_ids,
            empty: Vec::new().into(),
        }
    }
}

fn clone_table<T: Clone>(table: &HashMap<EntityId, T>) -> HashMap<EntityId, Arc<T>> {
    table
        .iter()
        .map(|(id, e)| (id.clone(), Arc::new(e.clone())))
        .collect()
}

struct Inner {
    state: RootState,
    view: Arc<Snapshot>,
}

pub struct SnapshotStore {
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    pub fn new(initial: RootState) -> Self {
        let view = Arc::new(Snapshot::build(&initial));
        Self {
            inner: RwLock::new(Inner {
                state: initial,
                view,
            }),
        }
    }

    fn view(&self) -> Arc<Snapshot> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .view
            .clone()
    }
}

impl StoreHandle for SnapshotStore {
    fn deck(&self, id: &str) -> Option<Arc<Deck>> {
        self.view().decks.get(id).cloned()
    }

    fn card(&self, id: &str) -> Option<Arc<Card>> {
        self.view().cards.get(id).cloned()
    }

    fn comment(&self, id: &str) -> Option<Arc<Comment>> {
        self.view().comments.get(id).cloned()
    }

    fn user(&self, id: &str) -> Option<Arc<User>> {
        self.view().users.get(id).cloned()
    }

    fn tag(&self, id: &str) -> Option<Arc<Tag>> {
        self.view().tags.get(id).cloned()
    }

    fn decks_order(&self) -> Arc<[EntityId]> {
        self.view().decks_order.clone()
    }

    fn card_ids(&self, deck_id: &str) -> Arc<[EntityId]> {
        let view = self.view();
        view.card_ids.get(deck_id).unwrap_or(&view.empty).clone()
    }

    fn comment_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let view = self.view();
        view.comment_ids.get(card_id).unwrap_or(&view.empty).clone()
    }

    fn tag_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let view = self.view();
        view.tag_ids.get(card_id).unwrap_or(&view.empty).clone()
    }

    fn assignee_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let view = self.view();
        view.assignee_ids
            .get(card_id)
            .unwrap_or(&view.empty)
            .clone()
    }

    fn apply(&self, action: &ActionRequest) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        match action {
            ActionRequest::UpdateCommentText { comment_id, text } => {
                let comment = inner
                    .state
                    .entities
                    .comments
                    .get_mut(comment_id)
                    .ok_or_else(|| StoreError::unknown(EntityKind::Comment, comment_id))?;
                comment.text = text.clone();
            }
            ActionRequest::ToggleCardTag { card_id, tag_id } => {
                if !inner.state.entities.cards.contains_key(card_id) {
                    return Err(StoreError::unknown(EntityKind::Card, card_id));
                }
                if !inner.state.entities.tags.contains_key(tag_id) {
                    return Err(StoreError::unknown(EntityKind::Tag, tag_id));
                }
                let link_id = format!("ct_{card_id}_{tag_id}");
                if inner.state.entities.card_tags.remove(&link_id).is_none() {
                    inner.state.entities.card_tags.insert(
                        link_id.clone(),
                        CardTag {
                            id: link_id,
                            card_id: card_id.clone(),
                            tag_id: tag_id.clone(),
                        },
                    );
                }
            }
            ActionRequest::BeginChurn { card_ids } => {
                for card_id in card_ids {
                    if !inner.state.entities.cards.contains_key(card_id) {
                        return Err(StoreError::unknown(EntityKind::Card, card_id));
                    }
                }
                for card_id in card_ids {
                    if let Some(card) = inner.state.entities.cards.get_mut(card_id) {
                        card.busy = true;
                    }
                }
            }
            ActionRequest::EndChurn => {
                for card in inner.state.entities.cards.values_mut() {
                    card.busy = false;
                }
            }
            ActionRequest::RenameUser { user_id, name } => {
                let user = inner
                    .state
                    .entities
                    .users
                    .get_mut(user_id)
                    .ok_or_else(|| StoreError::unknown(EntityKind::User, user_id))?;
                user.name = name.clone();
            }
            ActionRequest::SetVisibleCards { card_ids } => {
                for card_id in card_ids {
                    if !inner.state.entities.cards.contains_key(card_id) {
                        return Err(StoreError::unknown(EntityKind::Card, card_id));
                    }
                }
                for card in inner.state.entities.cards.values_mut() {
                    card.visible = card_ids.contains(&card.id);
                }
            }
        }

        inner.view = Arc::new(Snapshot::build(&inner.state));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statebench_harness::dataset::DatasetSpec;

    #[test]
    fn reads_are_stable_between_mutations() {
        let store = SnapshotStore::new(DatasetSpec::small().generate());
        let state = DatasetSpec::small().generate();
        let deck = state.first_deck_id().expect("deck").clone();

        let a = store.card_ids(&deck);
        let b = store.card_ids(&deck);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn every_mutation_replaces_the_whole_view() {
        let store = SnapshotStore::new(DatasetSpec::small().generate());
        let state = DatasetSpec::small().generate();
        let deck = state.first_deck_id().expect("deck").clone();
        let comment = state.sorted_comment_ids()[0].clone();

        let order_before = store.decks_order();
        let cards_before = store.card_ids(&deck);
        store
            .apply(&ActionRequest::UpdateCommentText {
                comment_id: comment,
                text: "rewritten".into(),
            })
            .expect("applies");
        assert!(!Arc::ptr_eq(&order_before, &store.decks_order()));
        assert!(!Arc::ptr_eq(&cards_before, &store.card_ids(&deck)));
        assert_eq!(cards_before.as_ref(), store.card_ids(&deck).as_ref());
    }
}
