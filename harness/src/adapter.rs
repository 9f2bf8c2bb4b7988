//! Capability interface every state-store backend must satisfy
//!
//! The runner and the workload driver depend only on this surface. A backend
//! provides a store factory, a fixed set of read hooks, and a uniform
//! mutation dispatch; optional capabilities are declared as flags checked
//! once at registration, never probed per call.
//!
//! Referential stability is part of the contract: a hook must hand back the
//! same `Arc` as long as the underlying data is unchanged, because render
//! instrumentation detects re-renders through pointer identity.

use std::sync::Arc;

use crate::dataset::{Card, Comment, Deck, EntityId, RootState, Tag, User};
use crate::error::{HarnessError, StoreError};

/// The mutation surface, expressed as dispatchable commands. Every scenario
/// in the catalogue is a deterministic sequence of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// High-frequency single-entity write (inline editing).
    UpdateCommentText { comment_id: EntityId, text: String },
    /// Batch multi-entity write (bulk tag toggles).
    ToggleCardTag { card_id: EntityId, tag_id: EntityId },
    /// Bulk start mutation across a bounded window of cards.
    BeginChurn { card_ids: Vec<EntityId> },
    /// Explicit stop: clears every busy flag the churn set.
    EndChurn,
    /// Rename with derived fan-out through assignments.
    RenameUser { user_id: EntityId, name: String },
    /// Scroll-driven visibility window.
    SetVisibleCards { card_ids: Vec<EntityId> },
}

impl ActionRequest {
    /// Stable action name, used in latency attribution and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ActionRequest::UpdateCommentText { .. } => "updateCommentText",
            ActionRequest::ToggleCardTag { .. } => "toggleCardTag",
            ActionRequest::BeginChurn { .. } => "beginChurn",
            ActionRequest::EndChurn => "endChurn",
            ActionRequest::RenameUser { .. } => "renameUser",
            ActionRequest::SetVisibleCards { .. } => "setVisibleCards",
        }
    }
}

/// A live store instance: read hooks plus mutation dispatch.
///
/// By-id hooks return `None` for unknown ids; id-collection hooks return an
/// empty slice for unknown parents. `apply` errors on unknown targets.
pub trait StoreHandle: Send + Sync {
    fn deck(&self, id: &str) -> Option<Arc<Deck>>;
    fn card(&self, id: &str) -> Option<Arc<Card>>;
    fn comment(&self, id: &str) -> Option<Arc<Comment>>;
    fn user(&self, id: &str) -> Option<Arc<User>>;
    fn tag(&self, id: &str) -> Option<Arc<Tag>>;

    /// Ordered deck ids for the board.
    fn decks_order(&self) -> Arc<[EntityId]>;
    /// Card ids of one deck, in the canonical child order.
    fn card_ids(&self, deck_id: &str) -> Arc<[EntityId]>;
    /// Comment ids of one card.
    fn comment_ids(&self, card_id: &str) -> Arc<[EntityId]>;
    /// Tag ids attached to one card.
    fn tag_ids(&self, card_id: &str) -> Arc<[EntityId]>;
    /// Assigned user ids of one card.
    fn assignee_ids(&self, card_id: &str) -> Arc<[EntityId]>;

    fn apply(&self, action: &ActionRequest) -> Result<(), StoreError>;
}

/// A pluggable state-management backend.
pub trait StoreAdapter: Send + Sync {
    /// Unique display identifier.
    fn name(&self) -> &str;

    /// Pure construction: no effects beyond the returned handle. Called once
    /// per adapter activation.
    fn create_store(&self, initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError>;

    /// Whether this backend needs explicit subscription wrapping around
    /// components. Checked once at registration; when false the identity
    /// wrapping is assumed.
    fn wraps_components(&self) -> bool {
        false
    }
}

/// The mutation surface bound to one store instance. Must be re-derived
/// whenever the store instance changes; never shared across adapters.
#[derive(Clone)]
pub struct ActionSet {
    handle: Arc<dyn StoreHandle>,
}

impl ActionSet {
    pub fn bind(handle: Arc<dyn StoreHandle>) -> Self {
        Self { handle }
    }

    pub fn dispatch(&self, action: &ActionRequest) -> Result<(), StoreError> {
        self.handle.apply(action)
    }

    pub fn update_comment_text(
        &self,
        comment_id: impl Into<EntityId>,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::UpdateCommentText {
            comment_id: comment_id.into(),
            text: text.into(),
        })
    }

    pub fn toggle_card_tag(
        &self,
        card_id: impl Into<EntityId>,
        tag_id: impl Into<EntityId>,
    ) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::ToggleCardTag {
            card_id: card_id.into(),
            tag_id: tag_id.into(),
        })
    }

    pub fn begin_churn(&self, card_ids: Vec<EntityId>) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::BeginChurn { card_ids })
    }

    pub fn end_churn(&self) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::EndChurn)
    }

    pub fn rename_user(
        &self,
        user_id: impl Into<EntityId>,
        name: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::RenameUser {
            user_id: user_id.into(),
            name: name.into(),
        })
    }

    pub fn set_visible_cards(&self, card_ids: Vec<EntityId>) -> Result<(), StoreError> {
        self.dispatch(&ActionRequest::SetVisibleCards { card_ids })
    }
}

/// Ordered, immutable adapter registry. Registration order defines display
/// and selection order.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn StoreAdapter>>,
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<Arc<dyn StoreAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StoreAdapter>> {
        self.adapters.iter()
    }

    pub fn first(&self) -> Option<&Arc<dyn StoreAdapter>> {
        self.adapters.first()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn StoreAdapter>, HarnessError> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| HarnessError::UnknownAdapter {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedOnly(&'static str);

    impl StoreAdapter for NamedOnly {
        fn name(&self) -> &str {
            self.0
        }

        fn create_store(&self, _initial: RootState) -> Result<Arc<dyn StoreHandle>, StoreError> {
            Err(StoreError::Construction("test adapter".into()))
        }
    }

    #[test]
    fn registry_preserves_registration_order() {
        let registry = AdapterRegistry::new(vec![
            Arc::new(NamedOnly("beta")),
            Arc::new(NamedOnly("alpha")),
        ]);
        assert_eq!(registry.names(), vec!["beta", "alpha"]);
        assert_eq!(registry.first().map(|a| a.name()), Some("beta"));
    }

    #[test]
    fn unknown_adapter_error_lists_options() {
        let registry = AdapterRegistry::new(vec![Arc::new(NamedOnly("alpha"))]);
        let err = registry.get("missing").err().unwrap();
        let message = err.to_string();
        assert!(message.contains("missing"));
        assert!(message.contains("alpha"));
    }

    #[test]
    fn action_names_are_stable() {
        let action = ActionRequest::UpdateCommentText {
            comment_id: "comment_00000".into(),
            text: "hello".into(),
        };
        assert_eq!(action.name(), "updateCommentText");
        assert_eq!(ActionRequest::EndChurn.name(), "endChurn");
    }
}
