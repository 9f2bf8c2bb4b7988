//! Board dataset model and deterministic generation
//!
//! The harness consumes a `RootState`-shaped object: id-keyed entity tables
//! plus an ordered deck sequence. Generation is seeded so that every run of a
//! given `DatasetSpec` produces the identical graph, and workload targets are
//! picked deterministically (first deck, first card, first N comments in id
//! order).

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Entity identifier. Generated ids are zero-padded so lexicographic order
/// matches creation order.
pub type EntityId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: EntityId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: EntityId,
    pub deck_id: EntityId,
    pub title: String,
    pub description: String,
    /// Set by the bulk churn action, cleared by its stop counterpart.
    pub busy: bool,
    /// Toggled by scroll-driven visibility windows.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub card_id: EntityId,
    pub author_id: EntityId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAssignment {
    pub id: EntityId,
    pub card_id: EntityId,
    pub user_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTag {
    pub id: EntityId,
    pub card_id: EntityId,
    pub tag_id: EntityId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub decks: HashMap<EntityId, Deck>,
    pub cards: HashMap<EntityId, Card>,
    pub comments: HashMap<EntityId, Comment>,
    pub users: HashMap<EntityId, User>,
    pub tags: HashMap<EntityId, Tag>,
    pub card_assignments: HashMap<EntityId, CardAssignment>,
    pub card_tags: HashMap<EntityId, CardTag>,
}

/// The full board state handed to an adapter's store factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootState {
    pub entities: Entities,
    pub decks_order: Vec<EntityId>,
}

impl RootState {
    pub fn first_deck_id(&self) -> Option<&EntityId> {
        self.decks_order.first()
    }

    /// Card ids of one deck in id order — the canonical child order every
    /// adapter must reproduce.
    pub fn cards_in(&self, deck_id: &str) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn comments_in(&self, card_id: &str) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .comments
            .values()
            .filter(|c| c.card_id == card_id)
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn tags_of(&self, card_id: &str) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .card_tags
            .values()
            .filter(|ct| ct.card_id == card_id)
            .map(|ct| ct.tag_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// All card ids in id order.
    pub fn sorted_card_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.cards.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All comment ids in id order.
    pub fn sorted_comment_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.comments.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All tag ids in id order.
    pub fn sorted_tag_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.tags.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn first_user_id(&self) -> Option<EntityId> {
        let mut ids: Vec<&EntityId> = self.entities.users.keys().collect();
        ids.sort();
        ids.first().map(|id| (*id).clone())
    }
}

/// Shape of a generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub decks: usize,
    pub cards_per_deck: usize,
    pub comments_per_card: usize,
    pub users: usize,
    pub tags: usize,
    pub seed: u64,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            decks: 5,
            cards_per_deck: 20,
            comments_per_card: 3,
            users: 8,
            tags: 12,
            seed: 42,
        }
    }
}

impl DatasetSpec {
    /// Small fixed dataset for the validation harness and tests.
    pub fn small() -> Self {
        Self {
            decks: 2,
            cards_per_deck: 4,
            comments_per_card: 2,
            users: 3,
            tags: 5,
            seed: 42,
        }
    }

    /// Builds the full board graph. Same spec, same graph.
    pub fn generate(&self) -> RootState {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut state = RootState::default();

        for u in 0..self.users {
            let id = format!("user_{u:02}");
            state.entities.users.insert(
                id.clone(),
                User {
                    id,
                    name: format!("User {u}"),
                },
            );
        }

        for t in 0..self.tags {
            let id = format!("tag_{t:02}");
            state.entities.tags.insert(
                id.clone(),
                Tag {
                    id,
                    label: format!("Tag {t}"),
                },
            );
        }

        let mut card_index = 0usize;
        let mut comment_index = 0usize;
        for d in 0..self.decks {
            let deck_id = format!("deck_{d:03}");
            state.entities.decks.insert(
                deck_id.clone(),
                Deck {
                    id: deck_id.clone(),
                    title: format!("Deck {d}"),
                },
            );
            state.decks_order.push(deck_id.clone());

            for _ in 0..self.cards_per_deck {
                let card_id = format!("card_{card_index:04}");
                let words = rng.gen_range(4..12);
                state.entities.cards.insert(
                    card_id.clone(),
                    Card {
                        id: card_id.clone(),
                        deck_id: deck_id.clone(),
                        title: format!("Card {card_index}"),
                        description: lorem(&mut rng, words),
                        busy: false,
                        visible: card_index < 30,
                    },
                );

                let assignee = format!("user_{:02}", card_index % self.users.max(1));
                let assignment_id = format!("assignment_{card_index:04}");
                state.entities.card_assignments.insert(
                    assignment_id.clone(),
                    CardAssignment {
                        id: assignment_id,
                        card_id: card_id.clone(),
                        user_id: assignee,
                    },
                );

                if self.tags > 0 && card_index % 2 == 0 {
                    let tag_id = format!("tag_{:02}", card_index % self.tags);
                    let link_id = format!("ct_{card_id}_{tag_id}");
                    state.entities.card_tags.insert(
                        link_id.clone(),
                        CardTag {
                            id: link_id,
                            card_id: card_id.clone(),
                            tag_id,
                        },
                    );
                }

                for _ in 0..self.comments_per_card {
                    let comment_id = format!("comment_{comment_index:05}");
                    let author = format!("user_{:02}", comment_index % self.users.max(1));
                    let words = rng.gen_range(3..9);
                    state.entities.comments.insert(
                        comment_id.clone(),
                        Comment {
                            id: comment_id,
                            card_id: card_id.clone(),
                            author_id: author,
                            text: lorem(&mut rng, words),
                        },
                    );
                    comment_index += 1;
                }

                card_index += 1;
            }
        }

        state
    }
}

const WORDS: &[&str] = &[
    "review", "merge", "deploy", "triage", "draft", "spec", "design", "ship",
    "audit", "refactor", "measure", "profile", "sync", "plan", "test", "fix",
];

fn lorem(rng: &mut StdRng, words: usize) -> String {
    (0..words)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = DatasetSpec::default().generate();
        let b = DatasetSpec::default().generate();
        assert_eq!(a, b);
    }

    #[test]
    fn counts_match_spec() {
        let spec = DatasetSpec::small();
        let state = spec.generate();
        assert_eq!(state.entities.decks.len(), spec.decks);
        assert_eq!(state.decks_order.len(), spec.decks);
        assert_eq!(state.entities.cards.len(), spec.decks * spec.cards_per_deck);
        assert_eq!(
            state.entities.comments.len(),
            spec.decks * spec.cards_per_deck * spec.comments_per_card
        );
        assert_eq!(state.entities.users.len(), spec.users);
        assert_eq!(state.entities.tags.len(), spec.tags);
    }

    #[test]
    fn relations_are_consistent() {
        let state = DatasetSpec::small().generate();
        let first_deck = state.first_deck_id().expect("has a deck").clone();
        let cards = state.cards_in(&first_deck);
        assert!(!cards.is_empty());
        for card_id in &cards {
            assert_eq!(state.entities.cards[card_id].deck_id, first_deck);
        }

        let first_card = &cards[0];
        for comment_id in state.comments_in(first_card) {
            assert_eq!(&state.entities.comments[&comment_id].card_id, first_card);
        }
    }

    #[test]
    fn target_helpers_are_stable() {
        let state = DatasetSpec::small().generate();
        assert_eq!(state.sorted_comment_ids().first().map(String::as_str), Some("comment_00000"));
        assert_eq!(state.first_user_id().as_deref(), Some("user_00"));
    }
}
