//! Indexed-collection backend
//!
//! Parent-to-children indexes are built once at construction and maintained
//! incrementally: a mutation replaces the `Arc` of the entity it touched and,
//! only when membership actually changed, the one index entry it affects.
//! Everything else keeps its identity, giving the minimal fan-out the
//! harness can observe.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use statebench_harness::adapter::{ActionRequest, StoreAdapter, StoreHandle};
use statebench_harness::dataset::{
    Card, CardAssignment, CardTag, Comment, Deck, EntityId, RootState, Tag, User,
};
use statebench_harness::error::{EntityKind, StoreError};

pub struct IndexedAdapter;

impl StoreAdapter for IndexedAdapter {
    fn name(&self) -> &str {
        "indexed-collections"
    }

    fn create_store(&self, initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError> {
        Ok(Arc::new(IndexedStore::new(initial)))
    }

    fn wraps_components(&self) -> bool {
        // Fine-grained subscriptions need an explicit wrapping layer.
        true
    }
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
    cards_by_deck: HashMap<EntityId, Arc<[EntityId]>>,
    comments_by_card: HashMap<EntityId, Arc<[EntityId]>>,
    tags_by_card: HashMap<EntityId, Arc<[EntityId]>>,
    assignees_by_card: HashMap<EntityId, Arc<[EntityId]>>,
    empty: Arc<[EntityId]>,
}

impl Tables {
    fn rebuild_tag_index(&mut self, card_id: &str) {
        let mut tag_ids: Vec<EntityId> = self
            .card_tags
            .values()
            .filter(|ct| ct.card_id == card_id)
            .map(|ct| ct.tag_id.clone())
            .collect();
        tag_ids.sort();
        self.tags_by_card.insert(card_id.to_string(), tag_ids.into());
    }

    fn replace_card(&mut self, card_id: &EntityId, card: Card) {
        self.cards.insert(card_id.clone(), Arc::new(card));
    }
}

pub struct IndexedStore {
    tables: RwLock<Tables>,
}

impl IndexedStore {
    pub fn new(initial: RootState) -> Self {
        let mut cards_by_deck = HashMap::new();
        for deck_id in initial.entities.decks.keys() {
            cards_by_deck.insert(deck_id.clone(), initial.cards_in(deck_id).into());
        }
        let mut comments_by_card = HashMap::new();
        let mut tags_by_card = HashMap::new();
        let mut assignees_by_card = HashMap::new();
        for card_id in initial.entities.cards.keys() {
            comments_by_card.insert(card_id.clone(), initial.comments_in(card_id).into());
            tags_by_card.insert(card_id.clone(), initial.tags_of(card_id).into());
            let mut assignees: Vec<EntityId> = initial
                .entities
                .card_assignments
                .values()
                .filter(|ca| &ca.card_id == card_id)
                .map(|ca| ca.user_id.clone())
                .collect();
            assignees.sort();
            assignees_by_card.insert(card_id.clone(), assignees.into());
        }

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
            cards_by_deck,
            comments_by_card,
            tags_by_card,
            assignees_by_card,
            empty: Vec::new().into(),
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl StoreHandle for IndexedStore {
    fn deck(&self, id: &str) -> Option<Arc<Deck>> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .decks
            .get(id)
            .cloned()
    }

    fn card(&self, id: &str) -> Option<Arc<Card>> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .cards
            .get(id)
            .cloned()
    }

    fn comment(&self, id: &str) -> Option<Arc<Comment>> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .comments
            .get(id)
            .cloned()
    }

    fn user(&self, id: &str) -> Option<Arc<User>> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .users
            .get(id)
            .cloned()
    }

    fn tag(&self, id: &str) -> Option<Arc<Tag>> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .tags
            .get(id)
            .cloned()
    }

    fn decks_order(&self) -> Arc<[EntityId]> {
        self.tables
            .read()
            .expect("store lock poisoned")
            .decks_order
            .clone()
    }

    fn card_ids(&self, deck_id: &str) -> Arc<[EntityId]> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .cards_by_deck
            .get(deck_id)
            .unwrap_or(&tables.empty)
            .clone()
    }

    fn comment_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .comments_by_card
            .get(card_id)
            .unwrap_or(&tables.empty)
            .clone()
    }

    fn tag_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .tags_by_card
            .get(card_id)
            .unwrap_or(&tables.empty)
            .clone()
    }

    fn assignee_ids(&self, card_id: &str) -> Arc<[EntityId]> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .assignees_by_card
            .get(card_id)
            .unwrap_or(&tables.empty)
            .clone()
    }

    fn apply(&self, action: &ActionRequest) -> Result<(), StoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");

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
                tables.rebuild_tag_index(card_id);
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
                        tables.replace_card(card_id, card);
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
                    tables.replace_card(&card_id, card);
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
                    tables.replace_card(&card_id, card);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statebench_harness::dataset::DatasetSpec;

    #[test]
    fn indexes_survive_unrelated_writes() {
        let store = IndexedStore::new(DatasetSpec::small().generate());
        let state = DatasetSpec::small().generate();
        let deck = state.first_deck_id().expect("deck").clone();
        let comment = state.sorted_comment_ids()[0].clone();

        let cards_before = store.card_ids(&deck);
        store
            .apply(&ActionRequest::UpdateCommentText {
                comment_id: comment,
                text: "touched".into(),
            })
            .expect("applies");
        let cards_after = store.card_ids(&deck);
        assert!(Arc::ptr_eq(&cards_before, &cards_after));
    }

    #[test]
    fn toggling_a_tag_replaces_only_that_index() {
        let store = IndexedStore::new(DatasetSpec::small().generate());
        let state = DatasetSpec::small().generate();
        let cards = state.sorted_card_ids();
        let target = cards[0].clone();
        let other = cards[1].clone();
        let tag = state.sorted_tag_ids()[0].clone();

        let target_before = store.tag_ids(&target);
        let other_before = store.tag_ids(&other);
        store
            .apply(&ActionRequest::ToggleCardTag {
                card_id: target.clone(),
                tag_id: tag.clone(),
            })
            .expect("applies");
        assert!(!Arc::ptr_eq(&target_before, &store.tag_ids(&target)));
        assert!(Arc::ptr_eq(&other_before, &store.tag_ids(&other)));
    }
}
