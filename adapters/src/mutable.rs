//! Manual-mutation backend
//!
//! Entities live behind individual `Arc`s that are replaced in place when
//! their content changes, so an untouched entity keeps its identity across
//! writes. Collection lookups are cached per parent but invalidated
//! coarsely: any successful mutation drops the whole cache, the way a
//! hand-rolled store re-derives its lists after every write.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use statebench_harness::adapter::{ActionRequest, StoreAdapter, StoreHandle};
use statebench_harness::dataset::{
    Card, CardAssignment, CardTag, Comment, Deck, EntityId, RootState, Tag, User,
};
use statebench_harness::error::{EntityKind, StoreError};

pub struct MutableAdapter;

impl StoreAdapter for MutableAdapter {
    fn name(&self) -> &str {
        "manual-mutation"
    }

    fn create_store(&self, initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError> {
        Ok(Arc::new(MutableStore::new(initial)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rel {
    Cards,
    Comments,
    Tags,
    Assignees,
}

struct Tables {
    decks: HashMap<EntityId, Arc<Deck>>,
    cards: HashMap<EntityId, Arc<Card>>,
    comments: HashMap<EntityId, Arc<Comment>>,
    users: HashMap<EntityId, Arc<User>>,
    tags: HashMap<EntityId, Arc<Tag>>,
    card_tags: HashMap<EntityId, CardTag>,
    card_assignments: HashMap<EntityId, CardAssignment>,
    decks_order: Arc<[EntityId]>,
    collections: HashMap<(Rel, EntityId), Arc<[EntityId]>>,
}

pub struct MutableStore {
    tables: Mutex<Tables>,
}

impl MutableStore {
    pub fn new(initial: RootState) -> Self {
        let entities = initial.entities;
        let tables = Tables {
            decks: entities
                .decks
                .into_iter()
                .map(|(id, e)| (id, Arc::new(e)))
                .collect(),
            cards: entities
                .cards
                .into_iter()
                .map(|(id, e)| (id, Arc::new(e)))
                .collect(),
            comments: entities
                .comments
                .into_iter()
                .map(|(id, e)| (id, Arc::new(e)))
                .collect(),
            users: entities
                .users
                .into_iter()
                .map(|(id, e)| (id, Arc::new(e)))
                .collect(),
            tags: entities
                .tags
                .into_iter()
                .map(|(id, e)| (id, Arc::new(e)))
                .collect(),
            card_tags: entities.card_tags,
            card_assignments: entities.card_assignments,
            decks_order: initial.decks_order.into(),
            collections: HashMap::new(),
        };
        Self {
            tables: Mutex::new(tables),
        }
    }

    fn collection(&self, rel: Rel, parent: &str) -> Arc<[EntityId]> {
        let mut tables = self.tables.lock().expect("store lock poisoned");
        if let Some(ids) = tables.collections.get(&(rel, parent.to_string())) {
            return ids.clone();
        }
        let mut ids: Vec<EntityId> = match rel {
            Rel::Cards => tables
                .cards
                .values()
                .filter(|c| c.deck_id == parent)
                .map(|c| c.id.clone())
                .collect(),
            Rel::Comments => tables
                .comments
                .values()
                .filter(|c| c.card_id == parent)
                .map(|c| c.id.clone())
                .collect(),
            Rel::Tags => tables
                .card_tags
                .values()
                .filter(|ct| ct.card_id == parent)
                .map(|ct| ct.tag_id.clone())
                .collect(),
            Rel::Assignees => tables
                .card_assignments
                .values()
                .filter(|ca| ca.card_id == parent)
                .map(|ca| ca.user_id.clone())
                .collect(),
        };
        ids.sort();
        let ids: Arc<[EntityId]> = ids.into();
        tables
            .collections
            .insert((rel, parent.to_string()), ids.clone());
        ids
    }
}

impl StoreHandle for MutableStore {
    fn deck(&self, id: &str) -> Option<Arc<Deck>> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .decks
            .get(id)
            .cloned()
    }

    fn card(&self, id: &str) -> Option<Arc<Card>> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .cards
            .get(id)
            .cloned()
    }

    fn comment(&self, id: &str) -> Option<Arc<Comment>> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .comments
            .get(id)
            .cloned()
    }

    fn user(&self, id: &str) -> Option<Arc<User>> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .users
            .get(id)
            .cloned()
    }

    fn tag(&self, id: &str) -> Option<Arc<Tag>> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .tags
            .get(id)
            .cloned()
    }

    fn decks_order(&self) -> Arc<[EntityId]> {
        self.tables
            .lock()
            .expect("store lock poisoned")
            .decks_order
            .clone()
    }

    fn card_ids(&self, deck_id: &str) -> Arc<[EntityId]> {
        self.collection(Rel::Cards, deck_id)
    }

    fn comment_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.collection(Rel::Comments, card_id)
    }

    fn tag_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.collection(Rel::Tags, card_id)
    }

    fn assignee_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        self.collection(Rel::Assignees, card_id)
    }

    fn apply(&self, action: &ActionRequest) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store lock poisoned");
        let mut changed = false;

        match action {
            ActionRequest::UpdateCommentText { comment_id, text } => {
                let existing = tables
                    .comments
                    .get(comment_id)
                    .ok_or_else(|| StoreError::unknown(EntityKind::Comment, comment_id))?;
                if existing.text != *text {
                    let mut comment = (**existing).clone();
                    comment.text = text.clone();
                    tables
                        .comments
                        .insert(comment_id.clone(), Arc::new(comment));
                    changed = true;
                }
            }
            ActionRequest::ToggleCardTag { card_id, tag_id } => {
                if !tables.cards.contains_key(card_id) {
                    return Err(StoreError::unknown(EntityKind::Card, card_id));
                }
                if !tables.tags.contains_key(tag_id) {
                    return Err(StoreError::unknown(EntityKind::Tag, tag_id));
                }
                let link_id = format!("ct_{card_id}_{tag_id}");
                if tables.card_tags.remove(&link_id).is_none() {
                    tables.card_tags.insert(
                        link_id.clone(),
                        CardTag {
                            id: link_id,
                            card_id: card_id.clone(),
                            tag_id: tag_id.clone(),
                        },
                    );
                }
                changed = true;
            }
            ActionRequest::BeginChurn { card_ids } => {
                for card_id in card_ids {
                    let existing = tables
                        .cards
                        .get(card_id)
                        .ok_or_else(|| StoreError::unknown(EntityKind::Card, card_id))?;
                    if !existing.busy {
                        let mut card = (**existing).clone();
                        card.busy = true;
                        tables.cards.insert(card_id.clone(), Arc::new(card));
                        changed = true;
                    }
                }
            }
            ActionRequest::EndChurn => {
                let busy_ids: Vec<EntityId> = tables
                    .cards
                    .values()
                    .filter(|c| c.busy)
                    .map(|c| c.id.clone())
                    .collect();
                for card_id in busy_ids {
                    let mut card = (*tables.cards[&card_id]).clone();
                    card.busy = false;
                    tables.cards.insert(card_id, Arc::new(card));
                    changed = true;
                }
            }
            ActionRequest::RenameUser { user_id, name } => {
                let existing = tables
                    .users
                    .get(user_id)
                    .ok_or_else(|| StoreError::unknown(EntityKind::User, user_id))?;
                if existing.name != *name {
                    let mut user = (**existing).clone();
                    user.name = name.clone();
                    tables.users.insert(user_id.clone(), Arc::new(user));
                    changed = true;
                }
            }
            ActionRequest::SetVisibleCards { card_ids } => {
                for card_id in card_ids {
                    if !tables.cards.contains_key(card_id) {
                        return Err(StoreError::unknown(EntityKind::Card, card_id));
                    }
                }
                let wanted: HashSet<&EntityId> = card_ids.iter().collect();
                let flips: Vec<EntityId> = tables
                    .cards
                    .values()
                    .filter(|c| c.visible != wanted.contains(&c.id))
                    .map(|c| c.id.clone())
                    .collect();
                for card_id in flips {
                    let mut card = (*tables.cards[&card_id]).clone();
                    card.visible = wanted.contains(&card_id);
                    tables.cards.insert(card_id, Arc::new(card));
                    changed = true;
                }
            }
        }

        if changed {
            // Coarse invalidation: every cached list is re-derived lazily.
            tables.collections.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statebench_harness::dataset::DatasetSpec;

    fn store() -> MutableStore {
        MutableStore::new(DatasetSpec::small().generate())
    }

    #[test]
    fn untouched_entities_keep_identity_across_writes() {
        let store = store();
        let state = DatasetSpec::small().generate();
        let comments = state.sorted_comment_ids();
        let edited = &comments[0];
        let untouched = &comments[1];

        let before = store.comment(untouched).expect("exists");
        store
            .apply(&ActionRequest::UpdateCommentText {
                comment_id: edited.clone(),
                text: "new text".into(),
            })
            .expect("applies");
        let after = store.comment(untouched).expect("exists");
        assert!(Arc::ptr_eq(&before, &after));

        let edited_now = store.comment(edited).expect("exists");
        assert_eq!(edited_now.text, "new text");
    }

    #[test]
    fn collection_cache_is_dropped_on_writes() {
        let store = store();
        let state = DatasetSpec::small().generate();
        let deck = state.first_deck_id().expect("deck").clone();

        let a = store.card_ids(&deck);
        let b = store.card_ids(&deck);
        assert!(Arc::ptr_eq(&a, &b));

        store
            .apply(&ActionRequest::RenameUser {
                user_id: state.first_user_id().expect("user"),
                name: "Renamed".into(),
            })
            .expect("applies");
        let c = store.card_ids(&deck);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.as_ref(), c.as_ref());
    }

    #[test]
    fn unknown_targets_are_rejected() {
        let store = store();
        let err = store
            .apply(&ActionRequest::UpdateCommentText {
                comment_id: "comment_99999".into(),
                text: "x".into(),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownEntity { .. }));
    }
}
